//! Persisted key layout.
//!
//! Every entity lives under an ASCII prefix followed by a binary key.
//! Integers embedded in keys are big-endian so prefix iteration visits
//! them in ascending order.

use strata_primitives::types::{concat_bytes, u64_from_be_bytes, u64_to_be_bytes};
use strata_primitives::{Address, Currency, Hash, ADDRESS_LEN};

pub const BALANCE: &[u8] = b"balance:";
pub const STAKE: &[u8] = b"stake:";
pub const DELEGATE: &[u8] = b"delegate:";
pub const DELEGATEE: &[u8] = b"delegatee:";
pub const EFFSTAKE: &[u8] = b"effstake:";
pub const EFFSTAKE_OF: &[u8] = b"effstake_of:";
pub const VALADDR: &[u8] = b"valaddr:";

pub const PARCEL: &[u8] = b"parcel:";
pub const REQUEST: &[u8] = b"request:";
pub const USAGE: &[u8] = b"usage:";
pub const REQUEST_EXPIRY: &[u8] = b"reqexp:";
pub const USAGE_EXPIRY: &[u8] = b"useexp:";

pub const UDC: &[u8] = b"udc:";
pub const UDC_BALANCE: &[u8] = b"udcbal:";
pub const UDC_LOCK: &[u8] = b"udclock:";

pub const HIBERNATE: &[u8] = b"hibernate:";
pub const MISS_RUN: &[u8] = b"missrun:";

pub const INCENTIVE: &[u8] = b"incentive:";
pub const INCENTIVE_BY_ADDR: &[u8] = b"incentive_addr:";
pub const PENALTY: &[u8] = b"penalty:";
pub const PENALTY_BY_ADDR: &[u8] = b"penalty_addr:";

pub const BLOCK_TXS: &[u8] = b"blocktx:";
pub const TX_BLOCK: &[u8] = b"txblock:";

pub const META_STATE: &[u8] = b"meta:state";
pub const META_VALSET: &[u8] = b"meta:valset";

pub fn balance(addr: &Address) -> Vec<u8> {
    concat_bytes(&[BALANCE, addr.as_bytes()])
}

pub fn stake(addr: &Address) -> Vec<u8> {
    concat_bytes(&[STAKE, addr.as_bytes()])
}

pub fn delegate(delegator: &Address) -> Vec<u8> {
    concat_bytes(&[DELEGATE, delegator.as_bytes()])
}

/// `delegatee:<holder>`: iteration prefix for a holder's delegators.
pub fn delegatee_prefix(holder: &Address) -> Vec<u8> {
    concat_bytes(&[DELEGATEE, holder.as_bytes()])
}

pub fn delegatee(holder: &Address, delegator: &Address) -> Vec<u8> {
    concat_bytes(&[DELEGATEE, holder.as_bytes(), delegator.as_bytes()])
}

pub fn effstake(amount: &Currency, holder: &Address) -> Vec<u8> {
    concat_bytes(&[EFFSTAKE, &amount.to_be_bytes(), holder.as_bytes()])
}

pub fn effstake_of(holder: &Address) -> Vec<u8> {
    concat_bytes(&[EFFSTAKE_OF, holder.as_bytes()])
}

pub fn valaddr(validator: &Address) -> Vec<u8> {
    concat_bytes(&[VALADDR, validator.as_bytes()])
}

pub fn parcel(id: &[u8]) -> Vec<u8> {
    concat_bytes(&[PARCEL, id])
}

pub fn request(buyer: &Address, id: &[u8]) -> Vec<u8> {
    concat_bytes(&[REQUEST, buyer.as_bytes(), id])
}

pub fn usage(grantee: &Address, id: &[u8]) -> Vec<u8> {
    concat_bytes(&[USAGE, grantee.as_bytes(), id])
}

pub fn request_expiry_prefix(height: u64) -> Vec<u8> {
    concat_bytes(&[REQUEST_EXPIRY, &u64_to_be_bytes(height)])
}

pub fn request_expiry(height: u64, buyer: &Address, id: &[u8]) -> Vec<u8> {
    concat_bytes(&[REQUEST_EXPIRY, &u64_to_be_bytes(height), buyer.as_bytes(), id])
}

pub fn usage_expiry_prefix(height: u64) -> Vec<u8> {
    concat_bytes(&[USAGE_EXPIRY, &u64_to_be_bytes(height)])
}

pub fn usage_expiry(height: u64, grantee: &Address, id: &[u8]) -> Vec<u8> {
    concat_bytes(&[USAGE_EXPIRY, &u64_to_be_bytes(height), grantee.as_bytes(), id])
}

pub fn udc(id: u32) -> Vec<u8> {
    concat_bytes(&[UDC, &id.to_be_bytes()])
}

pub fn udc_balance_prefix(id: u32) -> Vec<u8> {
    concat_bytes(&[UDC_BALANCE, &id.to_be_bytes()])
}

pub fn udc_balance(id: u32, holder: &Address) -> Vec<u8> {
    concat_bytes(&[UDC_BALANCE, &id.to_be_bytes(), holder.as_bytes()])
}

pub fn udc_lock(id: u32, holder: &Address) -> Vec<u8> {
    concat_bytes(&[UDC_LOCK, &id.to_be_bytes(), holder.as_bytes()])
}

pub fn hibernate(addr: &Address) -> Vec<u8> {
    concat_bytes(&[HIBERNATE, addr.as_bytes()])
}

pub fn miss_run_prefix(addr: &Address) -> Vec<u8> {
    concat_bytes(&[MISS_RUN, addr.as_bytes()])
}

pub fn miss_run(addr: &Address, start: u64) -> Vec<u8> {
    concat_bytes(&[MISS_RUN, addr.as_bytes(), &u64_to_be_bytes(start)])
}

pub fn incentive_prefix(height: u64) -> Vec<u8> {
    concat_bytes(&[INCENTIVE, &u64_to_be_bytes(height)])
}

pub fn incentive(height: u64, addr: &Address) -> Vec<u8> {
    concat_bytes(&[INCENTIVE, &u64_to_be_bytes(height), addr.as_bytes()])
}

pub fn incentive_by_addr_prefix(addr: &Address) -> Vec<u8> {
    concat_bytes(&[INCENTIVE_BY_ADDR, addr.as_bytes()])
}

pub fn incentive_by_addr(addr: &Address, height: u64) -> Vec<u8> {
    concat_bytes(&[INCENTIVE_BY_ADDR, addr.as_bytes(), &u64_to_be_bytes(height)])
}

pub fn penalty_prefix(height: u64) -> Vec<u8> {
    concat_bytes(&[PENALTY, &u64_to_be_bytes(height)])
}

pub fn penalty(height: u64, addr: &Address) -> Vec<u8> {
    concat_bytes(&[PENALTY, &u64_to_be_bytes(height), addr.as_bytes()])
}

pub fn penalty_by_addr_prefix(addr: &Address) -> Vec<u8> {
    concat_bytes(&[PENALTY_BY_ADDR, addr.as_bytes()])
}

pub fn penalty_by_addr(addr: &Address, height: u64) -> Vec<u8> {
    concat_bytes(&[PENALTY_BY_ADDR, addr.as_bytes(), &u64_to_be_bytes(height)])
}

pub fn block_txs(height: u64) -> Vec<u8> {
    concat_bytes(&[BLOCK_TXS, &u64_to_be_bytes(height)])
}

pub fn tx_block(hash: &Hash) -> Vec<u8> {
    concat_bytes(&[TX_BLOCK, hash])
}

// ── Key decoding ────────────────────────────────────────────────────────

/// Address found right after `prefix`, if the key is long enough.
pub fn address_after(key: &[u8], prefix_len: usize) -> Option<Address> {
    let bytes = key.get(prefix_len..prefix_len + ADDRESS_LEN)?;
    Address::from_slice(bytes).ok()
}

/// Big-endian u64 found at `offset`.
pub fn u64_at(key: &[u8], offset: usize) -> Option<u64> {
    u64_from_be_bytes(key.get(offset..)?)
}

/// Everything after `offset`.
pub fn tail(key: &[u8], offset: usize) -> Option<&[u8]> {
    key.get(offset..)
}
