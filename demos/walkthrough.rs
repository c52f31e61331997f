//! Walks one device from the factory floor to a customer, then shows a
//! replacement and the failure modes a caller is likely to hit.
//!
//! Run with `cargo run --example walkthrough`. Settings come from
//! `CUSTODY_DB_PATH`, `CUSTODY_LEDGER_TREE` and `CUSTODY_LOG_LEVEL`.

use anyhow::Context;
use device_custody::{
    Device, FixedInvocation, LifecycleEngine, Participant, Role, Router, SledLedger, TimeStamp,
    config::CustodyConfig, telemetry, utils,
};
use std::sync::Arc;
use tracing::info;

// a freshly minted participant holding `role`
fn actor(role: Role) -> anyhow::Result<Participant> {
    Ok(Participant::with_role(utils::new_actor_id(role)?, role))
}

fn main() -> anyhow::Result<()> {
    let config = CustodyConfig::from_env()?;
    telemetry::init(&config)?;

    let db = sled::open(&config.db_path)?;
    let tree = db.open_tree(&config.ledger_tree)?;
    // start from an empty ledger on every run
    tree.clear()?;

    let router = Router::new(LifecycleEngine::new(Arc::new(SledLedger::new(tree))));

    let manufacturer = actor(Role::Manufacturer)?;
    let warehouse = actor(Role::Warehouse)?;
    let store = actor(Role::Store)?;
    let custcare = actor(Role::CustCare)?;

    // the substrate hands us one agreed timestamp per invocation
    let submitted_at = TimeStamp::new();
    let as_manufacturer = FixedInvocation::new(manufacturer.clone(), submitted_at);
    let as_warehouse = FixedInvocation::new(warehouse.clone(), submitted_at);
    let as_store = FixedInvocation::new(store.clone(), submitted_at);
    let as_custcare = FixedInvocation::new(custcare.clone(), submitted_at);

    router
        .invoke(&as_manufacturer, "create_device", &["LN0000001"])
        .context("create failed: ")?;
    router.invoke(&as_manufacturer, "update_name", &["LENOVO", "LN0000001"])?;
    router.invoke(&as_manufacturer, "update_model", &["VIBE", "LN0000001"])?;
    router.invoke(
        &as_manufacturer,
        "update_manufacture_date",
        &["2017-03-03", "LN0000001"],
    )?;

    router.invoke(
        &as_manufacturer,
        "manufacturer_to_warehouse",
        &[warehouse.id.as_str(), "LN0000001", "warehouse"],
    )?;
    router.invoke(
        &as_warehouse,
        "warehouse_to_store",
        &[store.id.as_str(), "LN0000001", "store"],
    )?;
    router.invoke(
        &as_store,
        "store_to_custcare",
        &[custcare.id.as_str(), "LN0000001", "custcare"],
    )?;

    let payload = router.query(&as_custcare, "get_device_details", &["LN0000001"])?;
    let sold: Device = minicbor::decode(&payload)?;
    println!("{sold:#?}");

    // the customer's handset is swapped for a new one
    router.invoke(&as_manufacturer, "create_device", &["LN0000002"])?;
    router.invoke(
        &as_manufacturer,
        "manufacturer_to_custcare",
        &[custcare.id.as_str(), "LN0000002", "custcare", "LN0000001"],
    )?;

    let payload = router.query(&as_manufacturer, "get_devices", &[] as &[&str])?;
    let devices: Vec<Device> = minicbor::decode(&payload)?;
    for device in &devices {
        info!(identifier = %device.identifier, status = %device.status, "listed");
    }

    // failures come back as typed errors
    if let Err(err) = router.query(&as_store, "get_device_details", &["LN0000002"]) {
        println!("store lookup: {err}");
    }
    if let Err(err) = router.invoke(&as_manufacturer, "create_device", &["LN0000001"]) {
        println!("re-create: {err}");
    }
    if let Err(err) = router.invoke(&as_manufacturer, "create_device", &["LN-01"]) {
        println!("bad identifier: {err}");
    }
    if let Err(err) = router.query(&as_manufacturer, "get_vehicles", &[] as &[&str]) {
        println!("unknown operation: {err}");
    }

    db.flush()?;
    Ok(())
}
