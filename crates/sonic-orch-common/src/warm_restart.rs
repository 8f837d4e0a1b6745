//! Warm-restart coordination across orchestration modules.
//!
//! Mirrors the per-daemon warm restart managers elsewhere in the tree
//! (e.g. portsyncd's `WarmRestartManager`), but centralizes state for
//! every named module behind one handle so orchagent's many Orchs can
//! share a single coordinator instance instead of each re-deriving
//! cold/warm detection on its own.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Lower bound, in seconds, for a module's warm-restart reconciliation
/// timer.
pub const MINIMUM_WARMRESTART_TIMER_VALUE: u64 = 1;
/// Upper bound, in seconds, for a module's warm-restart reconciliation
/// timer.
pub const MAXIMUM_WARMRESTART_TIMER_VALUE: u64 = 9999;

/// Per-module warm-restart lifecycle state.
///
/// Transitions flow one way: `Init` -> `Restored` -> `Replayed` ->
/// `Reconciled`. A module stays at `Init` on a cold start; warm restart
/// enters `Restored` once its saved state is read back, `Replayed` once
/// every table it owns has been reapplied from the databases, and
/// `Reconciled` once stale entries left over from before the restart have
/// been cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarmRestartState {
    Init,
    Restored,
    Replayed,
    Reconciled,
}

impl std::fmt::Display for WarmRestartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WarmRestartState::Init => "INIT",
            WarmRestartState::Restored => "RESTORED",
            WarmRestartState::Replayed => "REPLAYED",
            WarmRestartState::Reconciled => "RECONCILED",
        };
        write!(f, "{s}")
    }
}

impl WarmRestartState {
    fn can_advance_to(self, next: WarmRestartState) -> bool {
        matches!(
            (self, next),
            (WarmRestartState::Init, WarmRestartState::Restored)
                | (WarmRestartState::Restored, WarmRestartState::Replayed)
                | (WarmRestartState::Replayed, WarmRestartState::Reconciled)
        )
    }
}

#[derive(Debug, Error)]
pub enum WarmRestartError {
    #[error("module {module} is not registered")]
    UnknownModule { module: String },

    #[error("module {module} cannot move from {from} to {to}: states only advance one step at a time")]
    InvalidTransition {
        module: String,
        from: WarmRestartState,
        to: WarmRestartState,
    },

    #[error("reconciliation timer of {secs}s is out of range [{min}, {max}]")]
    TimerOutOfRange { secs: u64, min: u64, max: u64 },
}

/// Per-module bookkeeping tracked by the coordinator.
#[derive(Debug, Clone)]
pub struct ModuleRestartInfo {
    /// Whether warm restart is enabled for this module (vs. a normal cold
    /// restart that always starts at `Init` and advances immediately).
    pub enabled: bool,
    state: WarmRestartState,
    /// Number of warm restarts this module has gone through.
    pub restart_count: u32,
    /// Keys the module re-derived during replay; used to diff against
    /// currently-applied state in order to find stale leftovers before
    /// `Reconciled`.
    replay_set: HashSet<String>,
    reconcile_timer: Duration,
    reconcile_deadline: Option<Instant>,
}

impl ModuleRestartInfo {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            state: WarmRestartState::Init,
            restart_count: 0,
            replay_set: HashSet::new(),
            reconcile_timer: Duration::from_secs(MAXIMUM_WARMRESTART_TIMER_VALUE),
            reconcile_deadline: None,
        }
    }

    pub fn state(&self) -> WarmRestartState {
        self.state
    }

    pub fn is_reconciled(&self) -> bool {
        self.state == WarmRestartState::Reconciled
    }

    /// True once the reconciliation timer has expired without the module
    /// having reached `Reconciled` on its own; callers treat this as "force
    /// reconcile now using whatever replay set exists".
    pub fn reconcile_timed_out(&self) -> bool {
        matches!(self.reconcile_deadline, Some(deadline) if Instant::now() >= deadline)
            && self.state != WarmRestartState::Reconciled
    }
}

/// Coordinates warm-restart state across every module in the daemon.
///
/// A single instance is constructed at startup and handed to every Orch
/// (as a shared reference) rather than looked up through a process-wide
/// global, so tests can run multiple independent coordinators in one
/// process.
#[derive(Debug, Default)]
pub struct WarmRestartCoordinator {
    modules: HashMap<String, ModuleRestartInfo>,
}

impl WarmRestartCoordinator {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Registers a module. `enabled` mirrors the `WARM_RESTART_ENABLE_TABLE`
    /// CONFIG_DB entry: when false the module is treated as always cold
    /// (restart_count never advances and state tracking is a no-op record
    /// kept only so callers can query it uniformly).
    pub fn register_module(&mut self, module: impl Into<String>, enabled: bool) {
        self.modules
            .entry(module.into())
            .or_insert_with(|| ModuleRestartInfo::new(enabled));
    }

    pub fn is_registered(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn state(&self, module: &str) -> Result<WarmRestartState, WarmRestartError> {
        self.get(module).map(|m| m.state)
    }

    pub fn is_enabled(&self, module: &str) -> Result<bool, WarmRestartError> {
        self.get(module).map(|m| m.enabled)
    }

    pub fn restart_count(&self, module: &str) -> Result<u32, WarmRestartError> {
        self.get(module).map(|m| m.restart_count)
    }

    fn get(&self, module: &str) -> Result<&ModuleRestartInfo, WarmRestartError> {
        self.modules
            .get(module)
            .ok_or_else(|| WarmRestartError::UnknownModule {
                module: module.to_string(),
            })
    }

    fn get_mut(&mut self, module: &str) -> Result<&mut ModuleRestartInfo, WarmRestartError> {
        self.modules
            .get_mut(module)
            .ok_or_else(|| WarmRestartError::UnknownModule {
                module: module.to_string(),
            })
    }

    /// Sets the reconciliation timer for a module, in seconds. Out-of-range
    /// values are rejected rather than clamped so a misconfigured timer
    /// fails loudly at startup.
    pub fn set_reconcile_timer_secs(
        &mut self,
        module: &str,
        secs: u64,
    ) -> Result<(), WarmRestartError> {
        if !(MINIMUM_WARMRESTART_TIMER_VALUE..=MAXIMUM_WARMRESTART_TIMER_VALUE).contains(&secs) {
            return Err(WarmRestartError::TimerOutOfRange {
                secs,
                min: MINIMUM_WARMRESTART_TIMER_VALUE,
                max: MAXIMUM_WARMRESTART_TIMER_VALUE,
            });
        }
        let info = self.get_mut(module)?;
        info.reconcile_timer = Duration::from_secs(secs);
        Ok(())
    }

    /// Advances a module from `Init` to `Restored`: its persisted state has
    /// been read back from the databases. Bumps `restart_count` and starts
    /// the reconciliation timer.
    pub fn restore(&mut self, module: &str) -> Result<(), WarmRestartError> {
        self.advance(module, WarmRestartState::Restored)?;
        let info = self.get_mut(module)?;
        info.restart_count += 1;
        info.reconcile_deadline = Some(Instant::now() + info.reconcile_timer);
        Ok(())
    }

    /// Advances a module from `Restored` to `Replayed`, recording the set
    /// of keys it reconstructed so `reconcile` can diff against them.
    pub fn replay(
        &mut self,
        module: &str,
        replayed_keys: impl IntoIterator<Item = String>,
    ) -> Result<(), WarmRestartError> {
        self.advance(module, WarmRestartState::Replayed)?;
        let info = self.get_mut(module)?;
        info.replay_set = replayed_keys.into_iter().collect();
        Ok(())
    }

    /// Advances a module from `Replayed` to `Reconciled`. Returns the keys
    /// present in `current_keys` that were never part of the replay set:
    /// these are stale entries left behind by the restarted process and
    /// should be deleted.
    pub fn reconcile(
        &mut self,
        module: &str,
        current_keys: impl IntoIterator<Item = String>,
    ) -> Result<Vec<String>, WarmRestartError> {
        self.advance(module, WarmRestartState::Reconciled)?;
        let info = self.get_mut(module)?;
        let stale: Vec<String> = current_keys
            .into_iter()
            .filter(|k| !info.replay_set.contains(k))
            .collect();
        info.replay_set.clear();
        info.reconcile_deadline = None;
        Ok(stale)
    }

    fn advance(
        &mut self,
        module: &str,
        next: WarmRestartState,
    ) -> Result<(), WarmRestartError> {
        let info = self.get_mut(module)?;
        if !info.enabled {
            // Cold-started modules don't go through the warm lifecycle;
            // treat every call as a trivial success so callers don't need
            // to special-case disabled modules.
            info.state = next;
            return Ok(());
        }
        if !info.state.can_advance_to(next) {
            return Err(WarmRestartError::InvalidTransition {
                module: module.to_string(),
                from: info.state,
                to: next,
            });
        }
        info.state = next;
        Ok(())
    }

    /// Returns every registered module whose reconciliation timer expired
    /// before it reached `Reconciled`.
    pub fn timed_out_modules(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, info)| info.reconcile_timed_out())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns true once every registered module has reached `Reconciled`
    /// (or was never warm-restart-enabled to begin with). The daemon uses
    /// this to decide when warm-boot-wide cleanup (e.g. clearing the
    /// system-wide `WARM_RESTART_IN_PROGRESS` flag) is safe.
    pub fn all_reconciled(&self) -> bool {
        self.modules
            .values()
            .all(|info| !info.enabled || info.state == WarmRestartState::Reconciled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_module_advances_freely() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("orchagent", false);

        coord.restore("orchagent").unwrap();
        coord.replay("orchagent", vec![]).unwrap();
        let stale = coord.reconcile("orchagent", vec![]).unwrap();
        assert!(stale.is_empty());
        assert_eq!(coord.state("orchagent").unwrap(), WarmRestartState::Reconciled);
    }

    #[test]
    fn warm_module_must_advance_in_order() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("vrforch", true);

        assert_eq!(coord.state("vrforch").unwrap(), WarmRestartState::Init);

        let err = coord.replay("vrforch", vec![]).unwrap_err();
        assert!(matches!(err, WarmRestartError::InvalidTransition { .. }));

        coord.restore("vrforch").unwrap();
        assert_eq!(coord.state("vrforch").unwrap(), WarmRestartState::Restored);
        assert_eq!(coord.restart_count("vrforch").unwrap(), 1);
    }

    #[test]
    fn reconcile_reports_stale_keys() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("routeorch", true);
        coord.restore("routeorch").unwrap();
        coord.replay(
            "routeorch",
            vec!["10.0.0.0/24".to_string(), "10.0.1.0/24".to_string()],
        ).unwrap();

        let stale = coord
            .reconcile(
                "routeorch",
                vec![
                    "10.0.0.0/24".to_string(),
                    "10.0.1.0/24".to_string(),
                    "10.0.2.0/24".to_string(),
                ],
            )
            .unwrap();

        assert_eq!(stale, vec!["10.0.2.0/24".to_string()]);
        assert_eq!(coord.state("routeorch").unwrap(), WarmRestartState::Reconciled);
    }

    #[test]
    fn unknown_module_is_an_error() {
        let coord = WarmRestartCoordinator::new();
        assert!(matches!(
            coord.state("nope"),
            Err(WarmRestartError::UnknownModule { .. })
        ));
    }

    #[test]
    fn timer_must_be_in_range() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("vrforch", true);

        assert!(coord.set_reconcile_timer_secs("vrforch", 0).is_err());
        assert!(coord.set_reconcile_timer_secs("vrforch", 10_000).is_err());
        assert!(coord.set_reconcile_timer_secs("vrforch", 30).is_ok());
    }

    #[test]
    fn reconcile_timeout_is_detected() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("vrforch", true);
        coord.set_reconcile_timer_secs("vrforch", MINIMUM_WARMRESTART_TIMER_VALUE).unwrap();
        coord.restore("vrforch").unwrap();

        assert!(coord.timed_out_modules().is_empty());
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(coord.timed_out_modules(), vec!["vrforch".to_string()]);
    }

    #[test]
    fn all_reconciled_ignores_disabled_modules() {
        let mut coord = WarmRestartCoordinator::new();
        coord.register_module("coldmod", false);
        coord.register_module("warmmod", true);
        assert!(!coord.all_reconciled());

        coord.restore("warmmod").unwrap();
        coord.replay("warmmod", vec![]).unwrap();
        coord.reconcile("warmmod", vec![]).unwrap();
        assert!(coord.all_reconciled());
    }
}
