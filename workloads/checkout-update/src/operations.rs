//! The checkout's optional operation set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use reflow_sdk::reflow_core::{ErrorAggregator, RequestContext};
use reflow_sdk::reflow_executor::{OperationSpec, OptionalOperationRegistry, RegistryError};

/// Recomputes order totals after a checkout mutation.
///
/// Enabled by default for every checkout command.
pub const ORDER_PREPARE: &str = "orderPrepare";

/// Aligns the payment instruction with the recomputed order total.
///
/// Requires a successful `orderPrepare`.
pub const SYNC_PAYMENT_INSTRUCTION: &str = "syncPaymentInstructionWithOrderTotal";

/// Order backend collaborator for the secondary operations.
pub trait OrderService: Send + Sync {
    fn prepare_order(&self, ctx: &RequestContext) -> anyhow::Result<()>;
    fn sync_payment_instruction(&self, ctx: &RequestContext) -> anyhow::Result<()>;
}

/// Build the checkout operation set over an order backend.
///
/// The registry is configured once per command type; per-request overrides
/// go through `RunConfig`.
pub fn checkout_registry(
    service: Arc<dyn OrderService>,
) -> Result<OptionalOperationRegistry, RegistryError> {
    let mut registry = OptionalOperationRegistry::new();

    let prepare = service.clone();
    registry.register(
        OperationSpec::new(
            ORDER_PREPARE,
            move |ctx: &RequestContext, _: &mut ErrorAggregator| prepare.prepare_order(ctx),
        )
        .enabled_by_default(true),
    )?;

    let sync = service;
    registry.register(
        OperationSpec::new(
            SYNC_PAYMENT_INSTRUCTION,
            move |ctx: &RequestContext, _: &mut ErrorAggregator| sync.sync_payment_instruction(ctx),
        )
        .depends_on(ORDER_PREPARE)
        .enabled_by_default(true),
    )?;

    Ok(registry)
}

/// Order service spy for tests and demos.
#[derive(Debug, Default)]
pub struct RecordingOrderService {
    fail_prepare: bool,
    prepared: AtomicUsize,
    synced: AtomicUsize,
}

impl RecordingOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose `orderPrepare` always faults.
    pub fn failing_prepare() -> Self {
        Self {
            fail_prepare: true,
            ..Self::default()
        }
    }

    /// How many times `orderPrepare` completed.
    pub fn prepared(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    /// How many times `syncPaymentInstructionWithOrderTotal` completed.
    pub fn synced(&self) -> usize {
        self.synced.load(Ordering::SeqCst)
    }
}

impl OrderService for RecordingOrderService {
    fn prepare_order(&self, _ctx: &RequestContext) -> anyhow::Result<()> {
        if self.fail_prepare {
            return Err(anyhow!("order backend rejected the prepare call"));
        }
        self.prepared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sync_payment_instruction(&self, _ctx: &RequestContext) -> anyhow::Result<()> {
        self.synced.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
