use anyhow::{Context, Result};
use ctor::ctor;
use fam_core::{error::Error, request::InitParam};
use fam_runtime::{MemoryStorage, Runtime, RuntimeConfig, RuntimeError};
use sha1::{Digest, Sha1};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Battery-backed NROM image whose program increments `$6000` once.
fn counter_image() -> Vec<u8> {
    let mut image = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0x02, 0];
    image.resize(16, 0);
    let mut prg = vec![0u8; 0x4000];
    let program = [
        0xEE, 0x00, 0x60, // INC $6000
        0x4C, 0x03, 0x80, // JMP *
    ];
    prg[..program.len()].copy_from_slice(&program);
    prg[0x3FFA..].copy_from_slice(&[0x00, 0x80, 0x00, 0x80, 0x00, 0x80]);
    image.extend_from_slice(&prg);
    image.extend_from_slice(&[0; 0x2000]);
    image
}

/// Boots the counter image, runs one frame and tears the worker down,
/// either through `shutdown` or by dropping the runtime.
fn run_once(storage: &MemoryStorage, shut_down: bool) -> Result<()> {
    let runtime = Runtime::start_with(
        RuntimeConfig::default(),
        fam_core::Famicom::new(),
        Box::new(storage.clone()),
    )?;
    let handle = runtime.handle();
    handle.set_parameter(InitParam::Rom(counter_image()))?;

    let power_on = handle.frame([0; 2]).context("power-on frame")?;
    assert!(power_on.storage.is_empty());
    let frame = handle.frame([0; 2]).context("first running frame")?;
    assert!(frame.screen.is_some());

    if !shut_down {
        drop(runtime);
        return Ok(());
    }
    handle.shutdown()?;
    assert!(matches!(
        handle.frame([0; 2]),
        Err(RuntimeError::ControlChannelDisconnected)
    ));
    Ok(())
}

fn saved_counter(storage: &MemoryStorage) -> Result<Vec<u8>> {
    let key = hex::encode(Sha1::digest(counter_image()));
    storage.get(&key).context("save entry")
}

#[test]
fn save_ram_survives_a_restart() -> Result<()> {
    let storage = MemoryStorage::new();
    run_once(&storage, true)?;
    assert_eq!(storage.len(), 1);

    run_once(&storage, true)?;
    let data = saved_counter(&storage)?;
    assert_eq!(data.len(), 0x2000);
    assert_eq!(data[0], 2);
    Ok(())
}

#[test]
fn dropping_the_runtime_flushes_save_ram() -> Result<()> {
    let storage = MemoryStorage::new();
    run_once(&storage, false)?;
    assert_eq!(saved_counter(&storage)?[0], 1);

    run_once(&storage, false)?;
    assert_eq!(saved_counter(&storage)?[0], 2);
    Ok(())
}

#[test]
fn load_errors_surface_from_the_worker() -> Result<()> {
    let runtime = Runtime::start(RuntimeConfig::default())?;
    let handle = runtime.handle();
    handle.set_parameter(InitParam::Rom(vec![0; 4]))?;
    let err = handle.frame([0; 2]).expect_err("truncated image");
    assert!(matches!(
        err,
        RuntimeError::Core(Error::TooShort { actual: 4 })
    ));
    Ok(())
}
