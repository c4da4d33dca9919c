//! `Fleet`: arena of bots and pods indexed by their typed ids.
//!
//! Ids are dense and assigned in registration order, so `BotId(i)` is
//! `bots[i]` and `PodId(i)` is `pods[i]`.  Bots and pods are never removed.

use tracing::debug;

use wh_core::{BotId, Point, PodId, WaypointId};
use wh_spatial::WaypointGraph;

use crate::{AgentError, AgentResult, Bot, BotKind, Kinematics, Pod, PodStatus};

#[derive(Clone, Debug, Default)]
pub struct Fleet {
    bots: Vec<Bot>,
    pods: Vec<Pod>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register a bot standing at `position`.
    pub fn add_bot(&mut self, kind: BotKind, position: Point, radius: f64, kinematics: Kinematics) -> BotId {
        let id = BotId(self.bots.len() as u32);
        self.bots.push(Bot::new(id, kind, position, radius, kinematics));
        id
    }

    /// Register a bot standing exactly on waypoint `at`.
    pub fn add_bot_at(
        &mut self,
        graph:      &WaypointGraph,
        at:         WaypointId,
        kind:       BotKind,
        radius:     f64,
        kinematics: Kinematics,
    ) -> AgentResult<BotId> {
        graph.check(at)?;
        kinematics.validate()?;
        let id = self.add_bot(kind, graph.position(at), radius, kinematics);
        self.bots[id.index()].current_waypoint = Some(at);
        Ok(id)
    }

    /// Register a free-standing pod.
    pub fn add_pod(&mut self, position: Point, capacity: u32) -> PodId {
        let id = PodId(self.pods.len() as u32);
        self.pods.push(Pod::new(id, position, capacity));
        id
    }

    /// Rest an uncarried pod on `waypoint`, marking it occupied in `graph`.
    pub fn place_pod(&mut self, pod: PodId, waypoint: WaypointId, graph: &mut WaypointGraph) -> AgentResult<()> {
        graph.check(waypoint)?;
        let p = self.pods.get(pod.index()).ok_or(AgentError::PodNotFound(pod))?;
        if let Some(carrier) = p.carrier {
            return Err(AgentError::PodAlreadyCarried { pod, carrier });
        }
        let previous = p.resident;
        graph.place_pod(waypoint, pod)?;
        if let Some(old) = previous.filter(|&old| old != waypoint) {
            graph.remove_pod(old);
        }
        let p = &mut self.pods[pod.index()];
        p.resident = Some(waypoint);
        p.position = graph.position(waypoint);
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn bot(&self, id: BotId) -> AgentResult<&Bot> {
        self.bots.get(id.index()).ok_or(AgentError::BotNotFound(id))
    }

    pub fn bot_mut(&mut self, id: BotId) -> AgentResult<&mut Bot> {
        self.bots.get_mut(id.index()).ok_or(AgentError::BotNotFound(id))
    }

    pub fn pod(&self, id: PodId) -> AgentResult<&Pod> {
        self.pods.get(id.index()).ok_or(AgentError::PodNotFound(id))
    }

    pub fn pod_mut(&mut self, id: PodId) -> AgentResult<&mut Pod> {
        self.pods.get_mut(id.index()).ok_or(AgentError::PodNotFound(id))
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// Mutable bot slice for per-tick updates.  Carrying relations are not
    /// reachable through it.
    pub fn bots_mut(&mut self) -> &mut [Bot] {
        &mut self.bots
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    // ── Carrying ──────────────────────────────────────────────────────────

    /// `bot` lifts `pod`.  Fails without side effects if the bot already
    /// carries something or the pod is already carried.
    pub fn pickup(&mut self, bot: BotId, pod: PodId, graph: &mut WaypointGraph) -> AgentResult<()> {
        let b = self.bot(bot)?;
        let p = self.pod(pod)?;
        if let Some(held) = b.carried {
            return Err(AgentError::AlreadyCarrying { bot, pod: held });
        }
        if let Some(carrier) = p.carrier {
            return Err(AgentError::PodAlreadyCarried { pod, carrier });
        }
        let position = b.position;

        let p = &mut self.pods[pod.index()];
        if let Some(w) = p.resident.take() {
            graph.remove_pod(w);
        }
        p.carrier = Some(bot);
        p.position = position;
        p.times_moved += 1;
        self.bots[bot.index()].carried = Some(pod);
        debug!(bot = %bot, pod = %pod, "pickup");
        Ok(())
    }

    /// `bot` puts down its pod.  The pod becomes resident on the bot's
    /// waypoint when the bot stands on a free one, otherwise it is left free.
    pub fn setdown(&mut self, bot: BotId, graph: &mut WaypointGraph) -> AgentResult<PodId> {
        let b = self.bot(bot)?;
        let pod = b.carried.ok_or(AgentError::NotCarrying(bot))?;
        let position = b.position;
        let on = b
            .current_waypoint
            .filter(|&w| graph.contains(w) && graph.position(w).distance(position) < crate::ARRIVAL_EPSILON)
            .filter(|&w| graph.occupant(w).is_none());

        self.bots[bot.index()].carried = None;
        let p = &mut self.pods[pod.index()];
        p.carrier = None;
        p.position = position;
        if let Some(w) = on {
            graph.place_pod(w, pod)?;
            p.resident = Some(w);
        }
        debug!(bot = %bot, pod = %pod, status = ?p.status(), "setdown");
        Ok(pod)
    }

    /// Move every carried pod to its carrier's position.
    pub fn sync_carried_pods(&mut self) {
        for b in &self.bots {
            if let Some(pod) = b.carried {
                self.pods[pod.index()].position = b.position;
            }
        }
    }

    // ── Paths ─────────────────────────────────────────────────────────────

    /// Hand `path` to `bot` after checking it is connected and starts at or
    /// next to the bot.
    pub fn assign_path(&mut self, bot: BotId, path: &[WaypointId], graph: &WaypointGraph) -> AgentResult<()> {
        let b = self.bot(bot)?;
        if let Some(&first) = path.first() {
            for &w in path {
                graph.check(w)?;
            }
            let attached = match b.current_waypoint {
                Some(cur) => cur == first || graph.is_adjacent(cur, first),
                None => graph.position(first).distance(b.position) < crate::ARRIVAL_EPSILON,
            };
            if !attached {
                return Err(AgentError::DetachedPath { bot, first });
            }
            if let Some(pair) = path.windows(2).find(|p| !graph.is_adjacent(p[0], p[1])) {
                return Err(AgentError::BrokenPath { bot, from: pair[0], to: pair[1] });
            }
        }
        self.bots[bot.index()].assign_path(path.iter().copied());
        Ok(())
    }

    /// Pods currently resting on a waypoint.
    pub fn resident_pods(&self) -> impl Iterator<Item = (PodId, WaypointId)> + '_ {
        self.pods.iter().filter_map(|p| match p.status() {
            PodStatus::Resident(w) => Some((p.id, w)),
            _ => None,
        })
    }
}
