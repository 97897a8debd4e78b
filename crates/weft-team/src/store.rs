//! Team Data Store: dense SoA table of team records.
//!
//! Records and center frames live in two parallel vectors indexed by
//! [`TeamId`]. Released slots are marked invalid and handed out again
//! lowest-first, so ids stay dense. Any reference obtained from the
//! store is a borrow and therefore cannot survive the next
//! `allocate`/`release`.

use weft_types::{ClothId, TeamId};

use crate::flags::TeamFlags;
use crate::team::{CenterData, TeamRecord};

/// Dense table of per-team simulation data.
#[derive(Debug, Default)]
pub struct TeamDataStore {
    teams: Vec<TeamRecord>,
    centers: Vec<CenterData>,
    /// Released slots, kept sorted descending so `pop` yields the lowest.
    free: Vec<u32>,
}

impl TeamDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a team slot for `cloth`, reusing the lowest released slot.
    pub fn allocate(&mut self, cloth: ClothId) -> TeamId {
        let id = match self.free.pop() {
            Some(slot) => {
                self.teams[slot as usize] = TeamRecord::new(cloth);
                self.centers[slot as usize] = CenterData::default();
                TeamId(slot)
            }
            None => {
                self.teams.push(TeamRecord::new(cloth));
                self.centers.push(CenterData::default());
                TeamId(self.teams.len() as u32 - 1)
            }
        };
        tracing::debug!(%id, %cloth, "team allocated");
        id
    }

    /// Releases a team slot. Returns false if the id was not live.
    pub fn release(&mut self, id: TeamId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let team = &mut self.teams[id.index()];
        team.flags = TeamFlags::empty();
        team.force_mode = Default::default();

        // Keep `free` sorted descending.
        let pos = self.free.partition_point(|&s| s > id.0);
        self.free.insert(pos, id.0);
        tracing::debug!(%id, "team released");
        true
    }

    /// True if `id` is inside the table and holds a live team.
    #[inline]
    pub fn is_valid(&self, id: TeamId) -> bool {
        self.teams.get(id.index()).is_some_and(|t| t.is_valid())
    }

    pub fn get(&self, id: TeamId) -> Option<&TeamRecord> {
        self.teams.get(id.index()).filter(|t| t.is_valid())
    }

    /// Mutable access to a live team record.
    pub fn get_ref(&mut self, id: TeamId) -> Option<&mut TeamRecord> {
        self.teams.get_mut(id.index()).filter(|t| t.is_valid())
    }

    pub fn get_center(&self, id: TeamId) -> Option<&CenterData> {
        if self.is_valid(id) {
            self.centers.get(id.index())
        } else {
            None
        }
    }

    /// Mutable access to a live team's center frame.
    pub fn get_center_ref(&mut self, id: TeamId) -> Option<&mut CenterData> {
        if self.is_valid(id) {
            self.centers.get_mut(id.index())
        } else {
            None
        }
    }

    /// Both halves of a live team at once.
    pub fn get_pair_mut(&mut self, id: TeamId) -> Option<(&mut TeamRecord, &mut CenterData)> {
        if !self.is_valid(id) {
            return None;
        }
        let i = id.index();
        Some((&mut self.teams[i], &mut self.centers[i]))
    }

    /// Table length, including released slots. Valid ids are below this.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Number of live teams.
    pub fn active_count(&self) -> usize {
        self.teams.len() - self.free.len()
    }

    /// Ids of all live teams in ascending order.
    pub fn active_ids(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_valid())
            .map(|(i, _)| TeamId(i as u32))
            .collect()
    }
}
