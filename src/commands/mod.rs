//! Commands Module
//!
//! All CLI subcommand implementations.

pub mod clean;
pub mod dedup;
pub mod dedup_near;
pub mod diagnose;
pub mod inspect;
pub mod pack;
pub mod quality;
pub mod run;
pub mod shard;
pub mod token_stats;
pub mod tokenize;

const RULE: &str = "═══════════════════════════════════════════════════════════";

pub(crate) fn banner(title: &str) {
    println!("{}", RULE);
    println!("  {}", title);
    println!("{}", RULE);
}

pub(crate) fn footer() {
    println!("{}", RULE);
}
