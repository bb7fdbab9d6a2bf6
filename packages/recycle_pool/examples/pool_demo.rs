//! Walks through the life of a pool of string records: stamping on reserve, scrubbing on release,
//! capacity limits, resets and what happens when contract violations are made in strict and
//! lenient mode.
//!
//! Run with `cargo run --example pool_demo` to also see the log output of the pool.

use std::collections::HashMap;

use recycle_pool::{
    CallbackRegistry, Entry, LocalPool, Pool, PoolConfig, Strictness, create_pool,
};

type Record = HashMap<String, String>;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== Stamp and scrub ===");
    stamp_and_scrub();

    println!();
    println!("=== Capacity and reset ===");
    capacity_and_reset();

    println!();
    println!("=== Strict and lenient ===");
    strict_and_lenient();

    println!();
    println!("=== Declarative configuration ===");
    declarative();
}

fn stamp_and_scrub() {
    let mut pool = Pool::<Record>::builder()
        .name("records")
        .on_reserve(|record| {
            record.insert("foo".to_string(), "bar".to_string());
        })
        .on_release(|record| record.clear())
        .build();

    let record = pool.reserve();
    record
        .borrow_mut()
        .insert("request".to_string(), "42".to_string());
    println!("Reserved: {:?}", record.borrow());

    pool.release(record.clone()).unwrap();
    println!("After release: {:?}", record.borrow());

    let again = pool.reserve();
    println!(
        "Reserved again (same entry: {}): {:?}",
        Entry::ptr_eq(&record, &again),
        again.borrow()
    );
}

fn capacity_and_reset() {
    let pool = LocalPool::from(
        Pool::<Record>::builder()
            .initial_size(5)
            .max_size(2)
            .on_reset(|free| println!("Resetting with {} available entries", free.len()))
            .build(),
    );

    println!("Available after construction: {}", pool.available());

    let entries = pool.reserve_many(3);
    println!(
        "Reserved {} entries, pool size is now {}",
        entries.len(),
        pool.size()
    );

    pool.release_many(entries).unwrap();
    println!(
        "Available after releasing all three: {} (one was dropped)",
        pool.available()
    );

    let orphan = pool.reserve();
    pool.reset();
    println!(
        "After reset: {} available, {} reserved",
        pool.available(),
        pool.reserved()
    );

    match pool.release(orphan) {
        Ok(()) => println!("Orphan released"),
        Err(error) => println!("Orphan rejected: {error}"),
    }
}

fn strict_and_lenient() {
    let mut strict = Pool::<Record>::builder().name("strict").build();

    match strict.release(Entry::new(Record::new())) {
        Ok(()) => println!("Stranger accepted"),
        Err(error) => println!("Strict pool: {error}"),
    }

    let mut lenient = Pool::<Record>::builder()
        .name("lenient")
        .strictness(Strictness::Lenient)
        .build();

    // Logs a warning instead of failing.
    lenient.release(Entry::new(Record::new())).unwrap();
    println!("Lenient pool still has {} available", lenient.available());
}

fn declarative() {
    let mut config = PoolConfig::default();
    config.name = Some("configured".to_string());
    config.initial_size = 2;
    config.on_release = Some("scrub".to_string());
    config.on_reserve = Some("does_not_exist".to_string());
    config.strictness = Strictness::Lenient;

    let mut callbacks = CallbackRegistry::<Record>::new();
    callbacks.register_entry_hook("scrub", Record::clear);

    // The unknown hook is logged and left unset.
    let pool = create_pool(&config, &callbacks).unwrap();
    println!("Configured pool: {pool:?}");

    config.strictness = Strictness::Strict;
    match create_pool(&config, &callbacks) {
        Ok(_) => println!("Strict configuration accepted"),
        Err(error) => println!("Strict configuration rejected: {error}"),
    }
}
