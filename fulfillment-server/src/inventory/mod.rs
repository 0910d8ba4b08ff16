//! Inventory ledger - stock reservation bookkeeping

pub mod ledger;
