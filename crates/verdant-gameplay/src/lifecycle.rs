//! Lifecycle engine: advances every planted cell by elapsed wall-clock time.
//!
//! Per plant and per tick, in order:
//! 1. water evaporates if the decay window since the last watering has passed
//! 2. a dry plant loses health
//! 3. a plant with water left grows by at most one stage
//!
//! Cells are visited in coordinate order so event order is stable.

use std::time::Duration;
use tracing::{debug, warn};

use verdant_common::Timestamp;

use crate::events::FarmEvent;
use crate::plot::PlotGrid;
use crate::season::SeasonProvider;
use crate::species::SpeciesCatalog;

/// Default time after the last watering at which water evaporates.
pub const DEFAULT_WATER_DECAY_WINDOW: Duration = Duration::from_secs(15);

/// Default health lost per second while a plant is dry.
pub const DEFAULT_DRY_HEALTH_DRAIN: f32 = 0.1;

/// Growth and decay tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleConfig {
    /// Multiplier on elapsed time fed to growth (1.0 = real time).
    pub growth_time_scale: f64,
    /// Time after the last watering at which water drops to zero.
    pub water_decay_window: Duration,
    /// Health lost per second while water is zero.
    pub dry_health_drain_per_sec: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            growth_time_scale: 1.0,
            water_decay_window: DEFAULT_WATER_DECAY_WINDOW,
            dry_health_drain_per_sec: DEFAULT_DRY_HEALTH_DRAIN,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Wall-clock time covered by the tick.
    pub elapsed: Duration,
    /// Events in the order they occurred.
    pub events: Vec<FarmEvent>,
}

impl TickReport {
    /// Number of stage advances.
    #[must_use]
    pub fn stages_advanced(&self) -> usize {
        self.count(|e| matches!(e, FarmEvent::StageAdvanced { .. }))
    }

    /// Number of cells that became ready.
    #[must_use]
    pub fn became_ready(&self) -> usize {
        self.count(|e| matches!(e, FarmEvent::BecameReady { .. }))
    }

    /// Number of cells whose water evaporated.
    #[must_use]
    pub fn evaporated(&self) -> usize {
        self.count(|e| matches!(e, FarmEvent::Evaporated { .. }))
    }

    fn count(&self, pred: impl Fn(&FarmEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

/// Advances the plot grid over time.
#[derive(Debug, Clone, Default)]
pub struct LifecycleEngine {
    config: LifecycleConfig,
}

impl LifecycleEngine {
    /// Create an engine with the given tunables.
    #[must_use]
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config }
    }

    /// The active tunables.
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Advance every cell from the grid's last tick time to `now`.
    pub fn tick<S: SeasonProvider + ?Sized>(
        &self,
        grid: &mut PlotGrid,
        catalog: &SpeciesCatalog,
        seasons: &S,
        now: Timestamp,
    ) -> TickReport {
        let elapsed = now.saturating_since(grid.last_tick_time());
        grid.set_last_tick_time(now);

        let mut report = TickReport {
            elapsed,
            events: Vec::new(),
        };
        if elapsed.is_zero() {
            return report;
        }

        let season = seasons.current_season();
        let growth_elapsed = self.scaled(elapsed);
        let drain = self.config.dry_health_drain_per_sec * elapsed.as_secs_f32();

        for coord in grid.coords() {
            let Some(cell) = grid.cell_mut(coord) else {
                continue;
            };
            let Some(plant) = cell.plant_mut() else {
                continue;
            };
            let Ok(species) = catalog.lookup(plant.species_id().as_str()) else {
                warn!("Skipping {} at {}: species not in catalog", plant.species_id(), coord);
                continue;
            };

            if now.saturating_since(plant.last_watered_at()) >= self.config.water_decay_window
                && plant.evaporate()
            {
                debug!("Water evaporated at {}", coord);
                report.events.push(FarmEvent::Evaporated { coord });
            }

            if plant.water_level() == 0 {
                if plant.drain_health(drain) {
                    debug!("Plant at {} withered", coord);
                    report.events.push(FarmEvent::Withered { coord });
                }
                continue;
            }

            if plant.advance_growth(species, growth_elapsed, season) {
                let stage = plant.growth_stage();
                debug!("{} at {} advanced to stage {}", species.id, coord, stage);
                report.events.push(FarmEvent::StageAdvanced { coord, stage });
            }

            if cell.sync_readiness() {
                report.events.push(FarmEvent::BecameReady { coord });
            }
        }

        report
    }

    fn scaled(&self, elapsed: Duration) -> Duration {
        let scale = self.config.growth_time_scale.max(0.0);
        if (scale - 1.0).abs() < f64::EPSILON {
            return elapsed;
        }
        Duration::from_millis((elapsed.as_millis() as f64 * scale) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plants::MAX_WATER_LEVEL;
    use crate::plot::PlotCell;
    use crate::season::Season;
    use crate::species::TERMINAL_STAGE;
    use crate::terrain::TileMap;
    use verdant_common::TileCoord;

    const ORIGIN: TileCoord = TileCoord::new(0, 0);

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_millis(secs * 1000)
    }

    fn planted(species: &str) -> (PlotGrid, SpeciesCatalog) {
        let catalog = SpeciesCatalog::with_defaults();
        let mut grid = PlotGrid::new(at(0));
        let map = TileMap::all_farmable(4, 4);
        let species = catalog.lookup(species).expect("species");
        grid.plant(ORIGIN, species, &map, at(0), Season::Spring)
            .expect("plant");
        (grid, catalog)
    }

    fn fill_water(grid: &mut PlotGrid, now: Timestamp) {
        while grid.water(ORIGIN, now) {}
    }

    #[test]
    fn test_zero_elapsed_is_noop() {
        let (mut grid, catalog) = planted("wheat");
        let engine = LifecycleEngine::default();
        let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(0));
        assert!(report.events.is_empty());
        assert_eq!(report.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_dry_plant_does_not_grow_and_loses_health() {
        let (mut grid, catalog) = planted("wheat");
        let engine = LifecycleEngine::default();

        let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(10));
        assert_eq!(report.stages_advanced(), 0);

        let plant = grid.plant_at(ORIGIN).expect("plant");
        assert_eq!(plant.growth_stage(), 0);
        assert!((plant.health() - 99.0).abs() < 1e-4);
    }

    #[test]
    fn test_watered_plant_advances() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let engine = LifecycleEngine::default();

        // 10s stage at 1.2x in spring: 9s is enough.
        let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(9));
        assert_eq!(report.events, vec![FarmEvent::StageAdvanced { coord: ORIGIN, stage: 1 }]);
    }

    #[test]
    fn test_decay_precedes_growth() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let engine = LifecycleEngine::default();

        // One long tick past the decay window: water is gone before growth runs.
        let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(15));
        assert_eq!(report.evaporated(), 1);
        assert_eq!(report.stages_advanced(), 0);

        let plant = grid.plant_at(ORIGIN).expect("plant");
        assert_eq!(plant.water_level(), 0);
        assert_eq!(plant.growth_stage(), 0);
    }

    #[test]
    fn test_decay_window_boundary() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let engine = LifecycleEngine::default();

        engine.tick(&mut grid, &catalog, &Season::Winter, at(14));
        assert_eq!(
            grid.plant_at(ORIGIN).map(|p| p.water_level()),
            Some(MAX_WATER_LEVEL)
        );

        let report = engine.tick(&mut grid, &catalog, &Season::Winter, at(15));
        assert_eq!(report.evaporated(), 1);
    }

    #[test]
    fn test_topping_up_full_plant_keeps_decay_deadline() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let engine = LifecycleEngine::default();

        engine.tick(&mut grid, &catalog, &Season::Winter, at(10));
        assert!(!grid.water(ORIGIN, at(10)));

        let report = engine.tick(&mut grid, &catalog, &Season::Winter, at(15));
        assert_eq!(report.evaporated(), 1);
        assert_eq!(grid.plant_at(ORIGIN).map(|p| p.water_level()), Some(0));
    }

    #[test]
    fn test_one_stage_per_tick() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let config = LifecycleConfig {
            water_decay_window: Duration::from_secs(3600),
            ..LifecycleConfig::default()
        };
        let engine = LifecycleEngine::new(config);

        let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(1000));
        assert_eq!(report.stages_advanced(), 1);
        assert_eq!(grid.plant_at(ORIGIN).map(|p| p.growth_stage()), Some(1));
    }

    #[test]
    fn test_reaching_terminal_marks_ready() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let config = LifecycleConfig {
            water_decay_window: Duration::from_secs(3600),
            ..LifecycleConfig::default()
        };
        let engine = LifecycleEngine::new(config);

        let mut ready_events = 0;
        for step in 1..=8 {
            let report = engine.tick(&mut grid, &catalog, &Season::Spring, at(step * 10));
            ready_events += report.became_ready();
        }

        assert_eq!(ready_events, 1);
        match grid.cell(ORIGIN) {
            PlotCell::ReadyToHarvest(plant) => assert_eq!(plant.growth_stage(), TERMINAL_STAGE),
            other => panic!("expected ready cell, got {other:?}"),
        }
    }

    #[test]
    fn test_growth_time_scale() {
        let (mut grid, catalog) = planted("wheat");
        fill_water(&mut grid, at(0));
        let engine = LifecycleEngine::new(LifecycleConfig {
            growth_time_scale: 10.0,
            ..LifecycleConfig::default()
        });

        // 1s scaled to 10s at 1.0x in winter completes a stage.
        let report = engine.tick(&mut grid, &catalog, &Season::Winter, at(1));
        assert_eq!(report.stages_advanced(), 1);
    }

    #[test]
    fn test_long_drought_withers_once() {
        let (mut grid, catalog) = planted("wheat");
        let engine = LifecycleEngine::new(LifecycleConfig {
            dry_health_drain_per_sec: 10.0,
            ..LifecycleConfig::default()
        });

        let first = engine.tick(&mut grid, &catalog, &Season::Spring, at(20));
        assert_eq!(first.events, vec![FarmEvent::Withered { coord: ORIGIN }]);
        let second = engine.tick(&mut grid, &catalog, &Season::Spring, at(40));
        assert!(second.events.is_empty());
        assert!(grid.plant_at(ORIGIN).is_some_and(|p| p.is_withered()));
    }
}
