//! SONiC Orchagent - Switch Orchestration Daemon
//!
//! This is the Rust implementation of the SONiC orchagent, responsible for
//! orchestrating switch configuration by translating high-level intent from
//! Redis databases into SAI API calls.
//!
//! # Architecture
//!
//! The orchagent follows an event-driven architecture:
//!
//! ```text
//! [CONFIG_DB] ─┐
//!              ├──> [OrchDaemon] ──> [SAI Redis] ──> [syncd] ──> [ASIC]
//! [APPL_DB] ───┘        │
//!                       ↓
//!                 [STATE_DB]
//! ```
//!
//! # Key Components
//!
//! - [`daemon::OrchDaemon`]: Main event loop and Orch coordination
//! - [`route`]: the Bulk route example Orch (stage → flush → post-process
//!   route and next-hop-group programming)
//! - [`vrf`]: VRF lifecycle with pending-remove reference-count gating
//! - [`crm`]: per-resource-type usage counters and threshold alerting
//! - [`audit`]: structured audit-log records for lifecycle and config events
//!
//! This crate holds only the core convergence-engine modules this workspace
//! actually implements; the full C++ orchagent has dozens of other per-object
//! Orchs (ports, ACL, QoS, tunnels, HA protocols, ...) this migration does
//! not cover.

pub mod audit;
pub mod crm;
pub mod daemon;
pub mod route;
pub mod vrf;

// ============================================================================
// Re-exports
// ============================================================================

pub use sonic_orch_common::{
    Constraint, Consumer, ConsumerConfig, KeyOpFieldsValues, Operation, Orch, OrchContext,
    RetryCache, SyncMap, TaskResult, TaskStatus,
};
pub use sonic_sai::{HalPolicy, PortOid, SaiError, SaiOpKind, SaiResult, SaiStatus, SwitchOid};
pub use sonic_types::{IpAddress, IpPrefix, MacAddress, VlanId};

pub use route::{
    register_route_orch, unregister_route_orch, NextHopFlags, NextHopGroupEntry, NextHopGroupKey,
    NextHopGroupTable, NextHopKey, RouteAttr, RouteEntry, RouteError, RouteKey, RouteNhg,
    RouteOrch, RouteOrchCallbacks, RouteOrchConfig, RouteTables,
};

pub use vrf::{
    register_vrf_orch, unregister_vrf_orch, L3VniEntry, Vni, VrfConfig, VrfEntry, VrfId, VrfName,
    VrfOrch, VrfOrchCallbacks, VrfOrchConfig, VrfOrchError, VrfVlanId,
};

pub use crm::{
    register_crm_orch, unregister_crm_orch, CrmOrch, CrmOrchCallbacks, CrmOrchConfig, CrmOrchError,
    CrmOrchStats, CrmResourceCounter, CrmResourceEntry, CrmResourceStatus, CrmResourceType,
    CrmThresholdField, CrmThresholdType, ThresholdCheck,
};

pub use daemon::{OrchDaemon, OrchDaemonConfig};
