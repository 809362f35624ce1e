//! Builds a small expression with broadcasting, rebinds its input and executes it again.
//!
//! Run with `RUST_LOG=lazy_value=trace` to see node creation and execution.
use lazy_value::{LazyResult, LazyValue, StackedLazyValue};
use tracing_subscriber::EnvFilter;

fn main() -> LazyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lazy_value=debug")),
        )
        .init();

    let readings = LazyValue::constant(vec![12.0, 15.5, 9.0, 20.25]);
    let offset = LazyValue::constant(0.5);
    let scale = StackedLazyValue::new([1.0, 1.0, 2.0, 2.0])?;

    let calibrated = readings.sub(&offset)?.mul(&*scale)?;
    println!("{calibrated:?}");
    println!("calibrated = {}", calibrated.execute()?);

    offset.assign(-1.0)?.apply();
    println!("after reassigning offset = {}", calibrated.execute()?);

    let peak = calibrated.index(3)?;
    println!("last element = {}", peak.execute()?);

    Ok(())
}
