use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A node's place in the m-ary tree: `(level, number)` under a given
/// `fanout`, with `number ∈ [0, fanout^level)`.
///
/// Grounded on spec.md §3/§4.1. The fanout travels with the position
/// (rather than living only on `NodeInfo`) because every position-math
/// operation below needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPosition {
    level: u32,
    number: u128,
    fanout: u8,
}

impl LogicalPosition {
    pub fn new(level: u32, number: u128, fanout: u8) -> Result<Self> {
        if !(2..=255).contains(&fanout) {
            return Err(Error::InvalidPosition(format!(
                "fanout {fanout} out of range [2,255]"
            )));
        }
        let capacity = (fanout as u128).checked_pow(level).ok_or_else(|| {
            Error::InvalidPosition(format!("level {level} overflows with fanout {fanout}"))
        })?;
        if number >= capacity {
            return Err(Error::InvalidPosition(format!(
                "number {number} out of range [0,{capacity}) at level {level}"
            )));
        }
        Ok(Self {
            level,
            number,
            fanout,
        })
    }

    pub fn root(fanout: u8) -> Result<Self> {
        Self::new(0, 0, fanout)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn number(&self) -> u128 {
        self.number
    }

    pub fn fanout(&self) -> u8 {
        self.fanout
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    /// Slot `self` occupies under its parent, in `[0, fanout)`.
    pub fn child_index(&self) -> Option<u8> {
        if self.is_root() {
            None
        } else {
            Some((self.number % self.fanout as u128) as u8)
        }
    }

    /// The ancestor of `self` at `level`, or `self` if `level` equals its
    /// own. `None` if `level` is below the root or deeper than `self`.
    pub fn ancestor_at_level(&self, level: u32) -> Option<LogicalPosition> {
        if level > self.level {
            return None;
        }
        let diff = self.level - level;
        Some(LogicalPosition {
            level,
            number: self.number / (self.fanout as u128).pow(diff),
            fanout: self.fanout,
        })
    }

    pub fn parent(&self) -> Option<LogicalPosition> {
        if self.is_root() {
            return None;
        }
        Some(LogicalPosition {
            level: self.level - 1,
            number: self.number / self.fanout as u128,
            fanout: self.fanout,
        })
    }

    /// The `k`-th child (`k ∈ [0, fanout)`) of `self`.
    pub fn child(&self, k: u8) -> Result<LogicalPosition> {
        if k as u16 >= self.fanout as u16 {
            return Err(Error::InvalidPosition(format!(
                "child index {k} out of range [0,{})",
                self.fanout
            )));
        }
        LogicalPosition::new(
            self.level + 1,
            self.number * self.fanout as u128 + k as u128,
            self.fanout,
        )
    }

    pub fn children(&self) -> Result<Vec<LogicalPosition>> {
        (0..self.fanout).map(|k| self.child(k)).collect()
    }

    fn sibling_at_offset(&self, offset: i128) -> Option<LogicalPosition> {
        let candidate = self.number as i128 + offset;
        if candidate < 0 {
            return None;
        }
        LogicalPosition::new(self.level, candidate as u128, self.fanout).ok()
    }

    /// Routing-table neighbors of `self`: positions at `number ± fanout^i *
    /// f` for `i ∈ {1,…,level}` and `f ∈ {1,…,fanout-1}`, clipped to the
    /// valid range at this level.
    ///
    /// `i` starts at 1, not 0 — see DESIGN.md, "routing-table neighbor
    /// offset index start".
    pub fn routing_table_neighbors(&self) -> Vec<LogicalPosition> {
        let mut out = Vec::new();
        for i in 1..=self.level {
            let Some(step) = (self.fanout as i128).checked_pow(i) else {
                break;
            };
            for f in 1..self.fanout {
                let offset = step * f as i128;
                if let Some(p) = self.sibling_at_offset(offset) {
                    out.push(p);
                }
                if let Some(p) = self.sibling_at_offset(-offset) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Search-exact forwarding rank against `other`: `(level_diff,
    /// number_gap)`, compared lexicographically so level distance always
    /// dominates. `number_gap` projects the deeper of the two positions onto
    /// the shallower one's level and counts slots apart from there.
    pub fn distance_rank(&self, other: &LogicalPosition) -> (u32, u128) {
        let level_diff = self.level.abs_diff(other.level);
        let (deeper, shallower) = if self.level > other.level {
            (self, other)
        } else {
            (other, self)
        };
        let diff = deeper.level - shallower.level;
        let projected = deeper.number / (deeper.fanout as u128).pow(diff);
        let number_gap = projected.abs_diff(shallower.number);
        (level_diff, number_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent() {
        let root = LogicalPosition::root(2).unwrap();
        assert!(root.parent().is_none());
    }

    #[test]
    fn child_then_parent_round_trips() {
        let root = LogicalPosition::root(3).unwrap();
        let child = root.child(2).unwrap();
        assert_eq!(child.parent().unwrap(), root);
        assert_eq!(child.child_index(), Some(2));
    }

    #[test]
    fn ancestor_at_level_walks_up_the_tree() {
        let grandchild = LogicalPosition::new(2, 1, 2).unwrap().child(0).unwrap();
        assert_eq!(grandchild.ancestor_at_level(2).unwrap(), LogicalPosition::new(2, 1, 2).unwrap());
        assert_eq!(grandchild.ancestor_at_level(0).unwrap(), LogicalPosition::root(2).unwrap());
        assert_eq!(grandchild.ancestor_at_level(3), None);
    }

    #[test]
    fn rejects_out_of_range_number() {
        assert!(LogicalPosition::new(1, 5, 2).is_err());
        assert!(LogicalPosition::new(1, 1, 2).is_ok());
    }

    #[test]
    fn routing_table_neighbor_matches_worked_example() {
        // 2:1 under fanout 2, routing-table neighbor at i=1 is 2:3.
        let pos = LogicalPosition::new(2, 1, 2).unwrap();
        let neighbors = pos.routing_table_neighbors();
        let three = LogicalPosition::new(2, 3, 2).unwrap();
        assert!(neighbors.contains(&three));
    }

    #[test]
    fn adjacent_slots_are_not_routing_table_neighbors() {
        let pos = LogicalPosition::new(2, 1, 2).unwrap();
        let neighbors = pos.routing_table_neighbors();
        let left = LogicalPosition::new(2, 0, 2).unwrap();
        let right = LogicalPosition::new(2, 2, 2).unwrap();
        assert!(!neighbors.contains(&left));
        assert!(!neighbors.contains(&right));
    }
}
