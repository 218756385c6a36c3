//! Block lifecycle orchestration.
//!
//! `App` drives one block at a time:
//!
//! ```text
//! init_chain ─► commit ─► begin_block ─► deliver_tx* ─► end_block ─► commit ─► ...
//!                                  ▲
//!                 check_tx (any time, committed view only)
//! ```
//!
//! BeginBlock: protocol upgrade, replay window, miss runs, wake-ups,
//! evidence penalties. EndBlock: expiry sweep, proposer incentive, laziness
//! penalties, validator set, replay index. Commit persists `AppState` and
//! the store; the store root is the app hash.

use strata_engine::operation::{sweep_expired, TxContext};
use strata_engine::{
    binding, distribution, hibernation, protocol, protocol_for, validator_set, ParsedTx,
    Protocol, ReplayPreventer, TransactionEngine, TxError,
};
use strata_primitives::{Address, BlockHeight, Event, Hash, ResultCode};
use strata_store::{LedgerStore, ValidatorEntry};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::genesis::GenesisState;
use crate::query::{self, QueryResponse};
use crate::state::AppState;

/// A validator's signature status for the previous block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteInfo {
    /// Consensus address of the validator.
    pub validator_address: Address,
    pub signed_last_block: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeginBlockRequest {
    pub height: BlockHeight,
    /// Consensus address of the proposer.
    pub proposer: Address,
    pub votes: Vec<VoteInfo>,
    /// Consensus addresses reported for misbehavior.
    pub byzantine: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResponse {
    pub code: ResultCode,
    pub log: String,
    pub events: Vec<Event>,
}

impl TxResponse {
    fn ok(events: Vec<Event>) -> Self {
        Self {
            code: ResultCode::Ok,
            log: String::new(),
            events,
        }
    }

    fn rejected(code: ResultCode) -> Self {
        Self {
            code,
            log: code.to_string(),
            events: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockResponse {
    pub validator_updates: Vec<ValidatorEntry>,
    pub events: Vec<Event>,
}

/// Handshake information for the consensus driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub last_block_height: BlockHeight,
    pub last_block_app_hash: Hash,
    pub protocol_version: u32,
}

#[derive(Debug, Clone)]
struct BlockContext {
    height: BlockHeight,
    proposer_holder: Option<Address>,
    delivered: u64,
}

#[derive(Debug)]
pub struct App {
    config: AppConfig,
    store: LedgerStore,
    state: AppState,
    engine: TransactionEngine,
    replay: ReplayPreventer,
    block: Option<BlockContext>,
}

impl App {
    /// Open the application over `store`, resuming from its committed state.
    pub fn new(config: AppConfig, store: LedgerStore) -> Result<Self, AppError> {
        config.validate()?;
        let state = match AppState::load(&store)? {
            Some(state) => state,
            None => AppState::genesis(config.genesis_protocol_version),
        };
        let engine = TransactionEngine::new(protocol_box(state.protocol_version)?);
        let mut replay = ReplayPreventer::new(config.chain.tx_index_range);
        replay.update(state.height);

        tracing::info!(
            height = state.height,
            protocol = state.protocol_version,
            "application opened"
        );
        Ok(Self {
            config,
            store,
            state,
            engine,
            replay,
            block: None,
        })
    }

    pub fn in_memory(config: AppConfig) -> Result<Self, AppError> {
        Self::new(config, LedgerStore::in_memory())
    }

    pub fn info(&self) -> AppInfo {
        AppInfo {
            last_block_height: self.state.height,
            last_block_app_hash: self.state.last_app_hash,
            protocol_version: self.state.protocol_version,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Shut down and hand back the store. Uncommitted writes are dropped.
    pub fn into_store(mut self) -> LedgerStore {
        self.store.discard();
        self.store
    }

    /// Reset the chain to the genesis in `app_state`. Returns the initial
    /// validator set. The writes become visible to committed reads with
    /// the following `commit`.
    pub fn init_chain(&mut self, app_state: &[u8]) -> Result<Vec<ValidatorEntry>, AppError> {
        let genesis = GenesisState::from_json(app_state)?;
        self.store.purge()?;
        genesis.apply(&mut self.store)?;

        self.state = AppState::genesis(self.config.genesis_protocol_version);
        self.engine
            .set_protocol(protocol_box(self.state.protocol_version)?);
        self.replay = ReplayPreventer::new(self.config.chain.tx_index_range);
        self.block = None;
        self.state.save(&mut self.store)?;

        let validators = validator_set::init_set(&mut self.store, &self.config.chain)?;
        tracing::info!(validators = validators.len(), "chain initialized");
        Ok(validators)
    }

    pub fn begin_block(&mut self, req: BeginBlockRequest) -> Result<Vec<Event>, AppError> {
        let expected = self.state.height + 1;
        if req.height != expected {
            return Err(AppError::UnexpectedHeight {
                expected,
                got: req.height,
            });
        }
        if self.block.is_some() {
            tracing::warn!(height = req.height, "abandoning unfinished block");
            self.store.discard();
        }
        let height = req.height;
        let mut events = Vec::new();

        if self.config.upgrade_protocol_height != 0
            && height == self.config.upgrade_protocol_height
            && self.state.protocol_version < self.config.upgrade_protocol_version
        {
            let (from, to) = (self.state.protocol_version, self.config.upgrade_protocol_version);
            protocol::migrate(&mut self.store, from, to)?;
            self.state.protocol_version = to;
            events.push(
                Event::new("protocol_upgrade")
                    .attr("from", from)
                    .attr("to", to)
                    .attr("height", height),
            );
        }
        self.engine
            .set_protocol(protocol_box(self.state.protocol_version)?);
        self.replay.update(height);

        let mut missing = Vec::new();
        for vote in req.votes.iter().filter(|v| !v.signed_last_block) {
            match self.store.holder_by_validator_address(&vote.validator_address, false)? {
                Some(holder) => missing.push(holder),
                None => tracing::debug!(validator = %vote.validator_address, "vote from unknown validator"),
            }
        }
        events.extend(hibernation::update_miss_runs(
            &mut self.store,
            height,
            &missing,
            &self.config.chain,
        )?);
        events.extend(hibernation::wake_up(&mut self.store, height)?);

        let mut byzantine = Vec::new();
        for validator in &req.byzantine {
            if let Some(holder) = self.store.holder_by_validator_address(validator, false)? {
                byzantine.push(holder);
            }
        }
        events.extend(distribution::penalize_evidence(
            &mut self.store,
            height,
            &byzantine,
            &self.config.chain,
        )?);

        let proposer_holder = self.store.holder_by_validator_address(&req.proposer, false)?;
        self.block = Some(BlockContext {
            height,
            proposer_holder,
            delivered: 0,
        });
        tracing::info!(
            height,
            protocol = self.state.protocol_version,
            missing = missing.len(),
            byzantine = byzantine.len(),
            "begin block"
        );
        Ok(events)
    }

    /// Mempool admission against the committed view.
    pub fn check_tx(&self, raw: &[u8]) -> Result<TxResponse, AppError> {
        let tx = match self.engine.parse(raw) {
            Ok(tx) => tx,
            Err(code) => return Ok(TxResponse::rejected(code)),
        };
        let ctx = TxContext {
            sender: tx.envelope.sender,
            height: self.state.height + 1,
            committed: true,
            params: &self.config.chain,
        };
        let result = binding::check(
            tx.envelope.last_height,
            self.state.height,
            self.config.chain.block_binding_window,
        )
        .and_then(|()| self.replay.check_committed(&tx.hash, &self.store, ctx.height))
        .and_then(|()| self.engine.check(&tx, &ctx, &self.store));
        finish("check", &tx, result.map(|()| Vec::new()))
    }

    pub fn deliver_tx(&mut self, raw: &[u8]) -> Result<TxResponse, AppError> {
        let block_height = match &self.block {
            Some(block) => block.height,
            None => return Err(AppError::NoBlockInProgress),
        };
        let tx = match self.engine.parse(raw) {
            Ok(tx) => tx,
            Err(code) => {
                tracing::debug!(height = block_height, %code, "undecodable transaction delivered");
                return Ok(TxResponse::rejected(code));
            }
        };
        let ctx = TxContext {
            sender: tx.envelope.sender,
            height: block_height,
            committed: false,
            params: &self.config.chain,
        };

        let result = binding::check(
            tx.envelope.last_height,
            block_height,
            self.config.chain.block_binding_window,
        )
        .and_then(|()| self.replay.append(tx.hash, &self.store))
        .and_then(|()| self.engine.execute(&tx, &ctx, &mut self.store));

        let mut response = finish("deliver", &tx, result)?;
        if response.is_ok() {
            if let Some(block) = self.block.as_mut() {
                block.delivered += 1;
            }
        }
        response.events.push(
            Event::new("tx")
                .attr("tx.type", &tx.envelope.tx_type)
                .attr("tx.sender", tx.envelope.sender),
        );
        Ok(response)
    }

    pub fn end_block(&mut self, height: BlockHeight) -> Result<EndBlockResponse, AppError> {
        let block = match &self.block {
            Some(block) if block.height == height => block.clone(),
            Some(block) => {
                return Err(AppError::UnexpectedHeight {
                    expected: block.height,
                    got: height,
                })
            }
            None => return Err(AppError::NoBlockInProgress),
        };
        let chain = &self.config.chain;
        let mut events = sweep_expired(
            &mut self.store,
            height,
            self.engine.protocol().expires_usages(),
        )?;

        if let Some(holder) = &block.proposer_holder {
            events.extend(distribution::distribute_incentive(
                &mut self.store,
                height,
                holder,
                block.delivered,
                chain,
            )?);
        }
        events.extend(distribution::penalize_laziness(&mut self.store, height, chain)?);

        let validator_updates = validator_set::update_set(&mut self.store, chain)?;
        self.replay.index(&mut self.store)?;

        tracing::info!(
            height,
            delivered = block.delivered,
            updates = validator_updates.len(),
            "end block"
        );
        Ok(EndBlockResponse {
            validator_updates,
            events,
        })
    }

    /// Persist the block (or the genesis) and return the new app hash.
    pub fn commit(&mut self) -> Result<Hash, AppError> {
        if let Some(block) = self.block.take() {
            self.state.height = block.height;
        }
        self.state.save(&mut self.store)?;
        let (version, root) = self.store.commit().inspect_err(|e| {
            tracing::error!(error = %e, "commit failed");
        })?;
        self.state.last_app_hash = root;
        tracing::info!(
            height = self.state.height,
            version,
            app_hash = %hex::encode(root),
            "committed"
        );
        Ok(root)
    }

    pub fn query(&self, path: &str, data: &[u8]) -> QueryResponse {
        query::handle(&self.store, &self.state, &self.config, path, data)
    }
}

fn protocol_box(version: u32) -> Result<Box<dyn Protocol>, AppError> {
    protocol_for(version).ok_or(AppError::UnknownProtocol(version))
}

/// Turn a transaction outcome into a response; store failures are fatal.
fn finish(
    stage: &str,
    tx: &ParsedTx,
    result: Result<Vec<Event>, TxError>,
) -> Result<TxResponse, AppError> {
    match result {
        Ok(events) => {
            tracing::debug!(stage, kind = tx.operation.kind(), sender = %tx.envelope.sender, "transaction ok");
            Ok(TxResponse::ok(events))
        }
        Err(TxError::Rejected(code)) => {
            tracing::debug!(stage, kind = tx.operation.kind(), sender = %tx.envelope.sender, %code, "transaction rejected");
            Ok(TxResponse::rejected(code))
        }
        Err(TxError::Store(err)) => {
            tracing::error!(stage, error = %err, "store failure during transaction");
            Err(AppError::Store(err))
        }
    }
}
