#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
extern crate alloc;

// Shared modules
pub mod errors;
pub mod events;
pub mod math;

// Fungible pool share token (CEP-18 compatible)
pub mod token;

// Vintage certificate token and the collaborator interface consumed by pools
pub mod vintage;

// Deposit eligibility screening
pub mod filter;

// Pooled carbon accounting engine
pub mod pool;
