//! Synthetic grid warehouse.
//!
//! A `length × width` grid of waypoints `spacing` metres apart, 4-connected.
//! Columns with `i % 4 == 0` are main aisles and `i % 4 == 2` narrow lanes;
//! the odd columns between them hold storage, except on the first and last
//! row and in the last column, which stay free as cross aisles.  Input
//! stations sit left of column 0 and output stations right of the last
//! column, each linked to the grid waypoint beside it.

use std::f64::consts::FRAC_PI_2;

use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};

use wh_agent::{BotKind, Fleet, Kinematics};
use wh_core::{ItemId, Point, SimRng, StationId, WaypointId};
use wh_spatial::{Attachment, WaypointGraph, WaypointGraphBuilder};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Grid columns.
    pub length:          usize,
    /// Grid rows.
    pub width:           usize,
    /// Metres between neighbouring waypoints.
    pub spacing:         f64,
    pub bots:            usize,
    /// The first `hazard_bots` bots turn in place before driving.
    pub hazard_bots:     usize,
    pub bot_radius:      f64,
    pub kinematics:      Kinematics,
    pub pods:            usize,
    pub pod_capacity:    u32,
    pub input_stations:  u32,
    pub output_stations: u32,
    /// Size of the item catalogue.
    pub items:           u32,
    /// Distinct items stocked in each pod.
    pub items_per_pod:   u32,
    pub units_per_item:  u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            length:          50,
            width:           30,
            spacing:         2.0,
            bots:            10,
            hazard_bots:     0,
            bot_radius:      0.3,
            kinematics:      Kinematics::default(),
            pods:            50,
            pod_capacity:    100,
            input_stations:  2,
            output_stations: 3,
            items:           20,
            items_per_pod:   4,
            units_per_item:  10,
        }
    }
}

/// Build the graph and a fleet with pods placed and stocked.
pub fn generate(config: &LayoutConfig, rng: &mut SimRng) -> Result<(WaypointGraph, Fleet)> {
    ensure!(config.length >= 2 && config.width >= 3, "grid must be at least 2 × 3");
    ensure!(config.spacing > 0.0, "spacing must be positive");

    let (l, wd, s) = (config.length, config.width, config.spacing);
    let mut b = WaypointGraphBuilder::with_capacity(l * wd + 8, 2 * l * wd);

    // Row-major: waypoint (i, j) has id j * length + i.
    let mut travel = Vec::new();
    let mut storage = Vec::new();
    for j in 0..wd {
        for i in 0..l {
            let shelf = i % 2 == 1 && i != l - 1 && j != 0 && j != wd - 1;
            let w = b.add_waypoint(Point::new(i as f64 * s, j as f64 * s), shelf);
            if shelf { storage.push(w) } else { travel.push(w) }
        }
    }
    let at = |i: usize, j: usize| WaypointId((j * l + i) as u32);
    for j in 0..wd {
        for i in 0..l {
            if i + 1 < l {
                b.add_edge(at(i, j), at(i + 1, j))?;
            }
            if j + 1 < wd {
                b.add_edge(at(i, j), at(i, j + 1))?;
            }
        }
    }

    let mut station_id = 0;
    for (k, kind) in [(config.input_stations, 0), (config.output_stations, 1)] {
        for n in 0..k {
            let row = (n as usize + 1) * wd / (k as usize + 1);
            let (col, x) = if kind == 0 { (0, -s) } else { (l - 1, l as f64 * s) };
            let w = b.add_waypoint(Point::new(x, row as f64 * s), false);
            let id = StationId(station_id);
            station_id += 1;
            b.attach(w, if kind == 0 { Attachment::InputStation(id) } else { Attachment::OutputStation(id) })?;
            b.add_edge(w, at(col, row))?;
        }
    }
    let mut graph = b.build();

    if config.bots > travel.len() {
        bail!("{} bots do not fit on {} travel waypoints", config.bots, travel.len());
    }
    if config.pods > storage.len() {
        bail!("{} pods do not fit on {} storage waypoints", config.pods, storage.len());
    }

    let mut fleet = Fleet::new();
    rng.shuffle(&mut travel);
    for (n, &w) in travel.iter().take(config.bots).enumerate() {
        let kind = if n < config.hazard_bots {
            BotKind::Hazard { turn_speed: FRAC_PI_2 }
        } else {
            BotKind::Standard
        };
        fleet.add_bot_at(&graph, w, kind, config.bot_radius, config.kinematics)?;
    }

    let catalogue: Vec<ItemId> = (0..config.items).map(ItemId).collect();
    rng.shuffle(&mut storage);
    for &w in storage.iter().take(config.pods) {
        let pod = fleet.add_pod(graph.position(w), config.pod_capacity);
        fleet.place_pod(pod, w, &mut graph)?;
        let mut stock = catalogue.clone();
        rng.shuffle(&mut stock);
        for &item in stock.iter().take(config.items_per_pod as usize) {
            if fleet.pod(pod)?.available_capacity() < config.units_per_item {
                break;
            }
            fleet.pod_mut(pod)?.add_items(item, config.units_per_item)?;
        }
    }

    Ok((graph, fleet))
}
