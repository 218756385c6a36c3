//! Data-parcel marketplace records.
//!
//! Requests and usages with a non-zero expiry are mirrored into
//! `reqexp:<height><addr><id>` / `useexp:<height><addr><id>` so the block
//! sweep can find everything lapsing at a height without a full scan.

use strata_primitives::{Address, BlockHeight, ADDRESS_LEN};

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::ledger::LedgerStore;
use crate::records::{Parcel, Request, Usage};

impl LedgerStore {
    pub fn parcel(&self, id: &[u8], committed: bool) -> StoreResult<Option<Parcel>> {
        self.get_json(&keys::parcel(id), committed)
    }

    pub fn set_parcel(&mut self, id: &[u8], parcel: &Parcel) -> StoreResult<()> {
        self.set_json(keys::parcel(id), parcel)
    }

    pub fn remove_parcel(&mut self, id: &[u8]) {
        self.remove(keys::parcel(id));
    }

    // ── Requests ────────────────────────────────────────────────────────

    pub fn request(&self, buyer: &Address, id: &[u8], committed: bool) -> StoreResult<Option<Request>> {
        self.get_json(&keys::request(buyer, id), committed)
    }

    pub fn set_request(&mut self, buyer: &Address, id: &[u8], request: &Request) -> StoreResult<()> {
        if let Some(prev) = self.request(buyer, id, false)? {
            if prev.expire_height != 0 {
                self.remove(keys::request_expiry(prev.expire_height, buyer, id));
            }
        }
        self.set_json(keys::request(buyer, id), request)?;
        if request.expire_height != 0 {
            self.set(keys::request_expiry(request.expire_height, buyer, id), Vec::new());
        }
        Ok(())
    }

    pub fn remove_request(&mut self, buyer: &Address, id: &[u8]) -> StoreResult<()> {
        if let Some(prev) = self.request(buyer, id, false)? {
            if prev.expire_height != 0 {
                self.remove(keys::request_expiry(prev.expire_height, buyer, id));
            }
            self.remove(keys::request(buyer, id));
        }
        Ok(())
    }

    /// Every pending request as `(buyer, parcel id, request)`.
    pub fn requests(&self, committed: bool) -> StoreResult<Vec<(Address, Vec<u8>, Request)>> {
        self.iterate(keys::REQUEST, false, committed)?
            .into_iter()
            .map(|(key, value)| {
                let buyer = keys::address_after(&key, keys::REQUEST.len())
                    .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
                let id = keys::tail(&key, keys::REQUEST.len() + ADDRESS_LEN).unwrap_or_default();
                let request = serde_json::from_slice(&value).map_err(|e| StoreError::corrupt(&key, e))?;
                Ok((buyer, id.to_vec(), request))
            })
            .collect()
    }

    /// `(buyer, parcel id)` of every request lapsing at `height`.
    pub fn requests_expiring_at(&self, height: BlockHeight) -> StoreResult<Vec<(Address, Vec<u8>)>> {
        expiring_at(self, &keys::request_expiry_prefix(height))
    }

    // ── Usages ──────────────────────────────────────────────────────────

    pub fn usage(&self, grantee: &Address, id: &[u8], committed: bool) -> StoreResult<Option<Usage>> {
        self.get_json(&keys::usage(grantee, id), committed)
    }

    pub fn set_usage(&mut self, grantee: &Address, id: &[u8], usage: &Usage) -> StoreResult<()> {
        if let Some(prev) = self.usage(grantee, id, false)? {
            if prev.expire_height != 0 {
                self.remove(keys::usage_expiry(prev.expire_height, grantee, id));
            }
        }
        self.set_json(keys::usage(grantee, id), usage)?;
        if usage.expire_height != 0 {
            self.set(keys::usage_expiry(usage.expire_height, grantee, id), Vec::new());
        }
        Ok(())
    }

    pub fn remove_usage(&mut self, grantee: &Address, id: &[u8]) -> StoreResult<()> {
        if let Some(prev) = self.usage(grantee, id, false)? {
            if prev.expire_height != 0 {
                self.remove(keys::usage_expiry(prev.expire_height, grantee, id));
            }
            self.remove(keys::usage(grantee, id));
        }
        Ok(())
    }

    /// `(grantee, parcel id)` of every usage lapsing at `height`.
    pub fn usages_expiring_at(&self, height: BlockHeight) -> StoreResult<Vec<(Address, Vec<u8>)>> {
        expiring_at(self, &keys::usage_expiry_prefix(height))
    }
}

fn expiring_at(store: &LedgerStore, prefix: &[u8]) -> StoreResult<Vec<(Address, Vec<u8>)>> {
    store
        .iterate(prefix, false, false)?
        .into_iter()
        .map(|(key, _)| {
            let addr = keys::address_after(&key, prefix.len())
                .ok_or_else(|| StoreError::corrupt(&key, "truncated address"))?;
            let id = keys::tail(&key, prefix.len() + ADDRESS_LEN).unwrap_or_default();
            Ok((addr, id.to_vec()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_primitives::Currency;

    fn addr(b: u8) -> Address {
        Address::new([b; ADDRESS_LEN])
    }

    #[test]
    fn test_parcel_lifecycle() {
        let mut store = LedgerStore::in_memory();
        let parcel = Parcel {
            owner: addr(1),
            custody: vec![1, 2, 3],
            extra: serde_json::json!({"name": "weather"}),
        };
        store.set_parcel(b"p1", &parcel).unwrap();
        assert_eq!(store.parcel(b"p1", false).unwrap(), Some(parcel));
        assert_eq!(store.parcel(b"p1", true).unwrap(), None);

        store.remove_parcel(b"p1");
        assert_eq!(store.parcel(b"p1", false).unwrap(), None);
    }

    #[test]
    fn test_request_expiry_index_follows_record() {
        let mut store = LedgerStore::in_memory();
        let request = Request {
            payment: Currency::from_u64(10),
            expire_height: 50,
            extra: serde_json::Value::Null,
        };
        store.set_request(&addr(2), b"p1", &request).unwrap();
        assert_eq!(
            store.requests_expiring_at(50).unwrap(),
            vec![(addr(2), b"p1".to_vec())]
        );
        assert!(store.requests_expiring_at(49).unwrap().is_empty());

        store.remove_request(&addr(2), b"p1").unwrap();
        assert!(store.requests_expiring_at(50).unwrap().is_empty());
        assert_eq!(store.request(&addr(2), b"p1", false).unwrap(), None);
    }

    #[test]
    fn test_usage_without_expiry_is_not_indexed() {
        let mut store = LedgerStore::in_memory();
        let usage = Usage {
            custody: vec![9],
            expire_height: 0,
        };
        store.set_usage(&addr(3), b"p1", &usage).unwrap();
        assert!(store.usages_expiring_at(0).unwrap().is_empty());

        let usage = Usage {
            custody: vec![9],
            expire_height: 12,
        };
        store.set_usage(&addr(3), b"p1", &usage).unwrap();
        assert_eq!(store.usages_expiring_at(12).unwrap().len(), 1);

        store.remove_usage(&addr(3), b"p1").unwrap();
        assert!(store.usages_expiring_at(12).unwrap().is_empty());
    }
}
