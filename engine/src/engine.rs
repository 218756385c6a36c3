//! Transaction engine: decode, verify, check and execute.
//!
//! Decoding order is fixed so every node reports the same code for the same
//! bytes:
//!
//! 1. envelope JSON (`BadParam`)
//! 2. operation type and payload under the active protocol (`Unknown` / `BadParam`)
//! 3. sender binding and signature (`BadSignature`)

use strata_primitives::{Event, Hash, ResultCode};
use strata_store::LedgerStore;

use crate::error::TxResult;
use crate::operation::{Operation, TxContext};
use crate::protocol::{Protocol, ProtocolV2};
use crate::transaction::{hash_of, Envelope};

/// A decoded, signature-checked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTx {
    pub envelope: Envelope,
    pub operation: Operation,
    pub hash: Hash,
}

pub struct TransactionEngine {
    protocol: Box<dyn Protocol>,
}

impl Default for TransactionEngine {
    fn default() -> Self {
        Self::new(Box::new(ProtocolV2))
    }
}

impl std::fmt::Debug for TransactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionEngine")
            .field("protocol", &self.protocol.version())
            .finish()
    }
}

impl TransactionEngine {
    pub fn new(protocol: Box<dyn Protocol>) -> Self {
        Self { protocol }
    }

    pub fn protocol(&self) -> &dyn Protocol {
        self.protocol.as_ref()
    }

    pub fn set_protocol(&mut self, protocol: Box<dyn Protocol>) {
        if protocol.version() != self.protocol.version() {
            tracing::info!(
                from = self.protocol.version(),
                to = protocol.version(),
                "protocol switched"
            );
        }
        self.protocol = protocol;
    }

    pub fn parse(&self, raw: &[u8]) -> Result<ParsedTx, ResultCode> {
        let envelope = Envelope::parse(raw)?;
        let operation = self
            .protocol
            .parse_operation(&envelope.tx_type, &envelope.payload)?;
        envelope.verify()?;
        Ok(ParsedTx {
            envelope,
            operation,
            hash: hash_of(raw),
        })
    }

    pub fn check(&self, tx: &ParsedTx, ctx: &TxContext<'_>, store: &LedgerStore) -> TxResult<()> {
        tx.operation.check(ctx, store)
    }

    pub fn execute(
        &self,
        tx: &ParsedTx,
        ctx: &TxContext<'_>,
        store: &mut LedgerStore,
    ) -> TxResult<Vec<Event>> {
        tx.operation.execute(ctx, store)
    }
}
