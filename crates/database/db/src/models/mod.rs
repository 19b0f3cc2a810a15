/// This module contains the batch database model.
pub mod batch;

/// This module contains the emergency state database model.
pub mod emergency_state;

/// This module contains the forced batch database model.
pub mod forced_batch;

/// This module contains the L1 block database model.
pub mod l1_block;

/// This module contains the pending state database model.
pub mod pending_state;

/// This module contains the rollup parameters database model.
pub mod rollup_parameters;

/// This module contains the sync watermark database model.
pub mod sync_watermark;
