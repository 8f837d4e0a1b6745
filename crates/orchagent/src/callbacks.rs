//! Default callback wiring for the daemon binary.
//!
//! NeighOrch and IntfsOrch aren't registered with the daemon yet, so this
//! stands in for the cross-Orch lookups RouteOrch needs until that wiring
//! lands. Same deferral as `init_sai` in `daemon/orchdaemon.rs`: there's no
//! SAI backend linked in yet, so every SAI call reports `SaiError`.

use async_trait::async_trait;
use sonic_orchagent::route::{NextHopGroupKey, NextHopKey, RouteError, RouteOrchCallbacks};
use sonic_sai::types::RawSaiObjectId;
use sonic_types::IpPrefix;

pub struct UnwiredRouteCallbacks;

#[async_trait]
impl RouteOrchCallbacks for UnwiredRouteCallbacks {
    fn has_next_hop(&self, _nexthop: &NextHopKey) -> bool {
        false
    }

    fn get_next_hop_id(&self, _nexthop: &NextHopKey) -> Option<RawSaiObjectId> {
        None
    }

    fn get_router_intf_id(&self, _alias: &str) -> Option<RawSaiObjectId> {
        None
    }

    fn vrf_exists(&self, vrf_id: RawSaiObjectId) -> bool {
        vrf_id == 0
    }

    fn increase_next_hop_ref_count(&self, _nexthop: &NextHopKey) {}
    fn decrease_next_hop_ref_count(&self, _nexthop: &NextHopKey) {}
    fn increase_router_intf_ref_count(&self, _alias: &str) {}
    fn decrease_router_intf_ref_count(&self, _alias: &str) {}
    fn increase_vrf_ref_count(&self, _vrf_id: RawSaiObjectId) {}
    fn decrease_vrf_ref_count(&self, _vrf_id: RawSaiObjectId) {}

    async fn sai_create_nhg(
        &self,
        _nhg_key: &NextHopGroupKey,
    ) -> Result<RawSaiObjectId, RouteError> {
        Err(RouteError::SaiError(
            "SAI not linked".to_string(),
        ))
    }

    async fn sai_remove_nhg(&self, _nhg_id: RawSaiObjectId) -> Result<(), RouteError> {
        Err(RouteError::SaiError(
            "SAI not linked".to_string(),
        ))
    }

    async fn sai_create_route(
        &self,
        _vrf_id: RawSaiObjectId,
        _prefix: &IpPrefix,
        _nhg_id: Option<RawSaiObjectId>,
        _blackhole: bool,
    ) -> Result<(), RouteError> {
        Err(RouteError::SaiError(
            "SAI not linked".to_string(),
        ))
    }

    async fn sai_remove_route(
        &self,
        _vrf_id: RawSaiObjectId,
        _prefix: &IpPrefix,
    ) -> Result<(), RouteError> {
        Err(RouteError::SaiError(
            "SAI not linked".to_string(),
        ))
    }

    async fn sai_set_route(
        &self,
        _vrf_id: RawSaiObjectId,
        _prefix: &IpPrefix,
        _nhg_id: Option<RawSaiObjectId>,
        _blackhole: bool,
    ) -> Result<(), RouteError> {
        Err(RouteError::SaiError(
            "SAI not linked".to_string(),
        ))
    }
}
