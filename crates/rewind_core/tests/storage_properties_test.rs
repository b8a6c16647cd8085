//! # Storage Property Tests
//!
//! Set-level guarantees: packing scenarios, idempotence and the rollback law
//! under seeded random mutation.
//!
//! Run with: cargo test --test storage_properties_test

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rewind_core::{DataSet, OwningGroup, Packing, RewindableDataSet, RewindableSet, SparseSet};

const ID_RANGE: i32 = 96;

/// Everything a caller can observe about a data set: per id its dense slot
/// and payload, plus the live count.
fn observe(set: &DataSet<u32>) -> (usize, Vec<Option<(usize, u32)>>) {
    let slots = (0..ID_RANGE)
        .map(|id| {
            let index = set.sparse_set().index_of(id)?;
            Some((index, *set.get(id)?))
        })
        .collect();
    (set.count(), slots)
}

fn mutate(set: &mut DataSet<u32>, rng: &mut ChaCha8Rng, steps: usize) {
    for _ in 0..steps {
        let id = rng.gen_range(-2..ID_RANGE);
        match rng.gen_range(0..10) {
            0..=4 => {
                set.insert(id, rng.gen());
            }
            5..=7 => {
                set.unassign(id);
            }
            8 => {
                if let Some(value) = set.get_mut(id) {
                    *value = value.wrapping_add(1);
                }
            }
            _ => set.compact(),
        }
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_scenario_continuous_swap_remove() {
    let mut set = SparseSet::with_capacity(4, Packing::Continuous);
    set.assign(0);
    set.assign(1);
    set.assign(2);
    set.unassign(1);

    assert!(set.is_assigned(0));
    assert!(!set.is_assigned(1));
    assert!(set.is_assigned(2));
    assert_eq!(set.count(), 2);
    assert_eq!(set.index_of(2), Some(1));
}

#[test]
fn test_scenario_stable_index_survives_rollback() {
    let mut set = RewindableDataSet::new(DataSet::<u32>::new(2, Packing::WithHoles), 4);
    set.insert(0, 77);
    let index = set.sparse_set().index_of(0);
    set.save_frame();

    set.unassign(0);
    assert!(!set.is_assigned(0));

    // Only the baseline is recorded, so the request clamps to it.
    assert_eq!(set.rollback(1), 0);
    assert!(set.is_assigned(0));
    assert_eq!(set.sparse_set().index_of(0), index);
    assert_eq!(set.get(0), Some(&77));
}

#[test]
fn test_scenario_owning_group_over_two_sets() {
    let mut sets = vec![SparseSet::new(Packing::Continuous), SparseSet::new(Packing::Continuous)];
    sets[0].assign(1);
    sets[1].assign(1);

    let mut group = OwningGroup::new(&[0, 1], &[0, 1], &[], sets.as_slice()).unwrap();
    group.ensure_synced(sets.as_mut_slice());
    assert_eq!(group.len(), 1);

    sets[0].assign(5);
    group.on_assigned(0, 5, sets.as_mut_slice());
    assert_eq!(group.len(), 1);

    sets[1].assign(5);
    group.on_assigned(1, 5, sets.as_mut_slice());
    assert_eq!(group.len(), 2);
    assert_eq!(sets[0].index_of(5), sets[1].index_of(5));
    assert!(sets[0].index_of(5).is_some_and(|index| index < 2));

    group.on_before_unassigned(0, 5, sets.as_mut_slice());
    assert_eq!(group.len(), 1);
    assert!(sets[0].is_assigned(5));
    sets[0].unassign(5);

    assert_eq!(group.ids(sets.as_slice()), &[1]);
}

// ============================================================================
// SPARSE SET LAWS
// ============================================================================

#[test]
fn test_assign_is_idempotent() {
    for packing in [Packing::Continuous, Packing::WithHoles] {
        let mut once = SparseSet::new(packing);
        let mut twice = SparseSet::new(packing);
        for id in [3, 9, 1] {
            once.assign(id);
            twice.assign(id);
            twice.assign(id);
        }

        assert_eq!(once.state(), twice.state());
        assert_eq!(once.ids().collect::<Vec<_>>(), twice.ids().collect::<Vec<_>>());
    }
}

#[test]
fn test_assign_then_unassign_restores_membership() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for packing in [Packing::Continuous, Packing::WithHoles] {
        let mut set = SparseSet::new(packing);
        for _ in 0..40 {
            set.assign(rng.gen_range(0..ID_RANGE));
        }
        let before: Vec<bool> = (0..ID_RANGE).map(|id| set.is_assigned(id)).collect();
        let live = set.ids().count();

        let fresh = (0..ID_RANGE).find(|&id| !set.is_assigned(id)).unwrap();
        set.assign(fresh);
        set.unassign(fresh);

        let after: Vec<bool> = (0..ID_RANGE).map(|id| set.is_assigned(id)).collect();
        assert_eq!(before, after);
        assert_eq!(set.ids().count(), live);
    }
}

#[test]
fn test_lookup_invariant_under_random_ops() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for packing in [Packing::Continuous, Packing::WithHoles] {
        let mut set = DataSet::<u32>::new(16, packing);
        for _ in 0..50 {
            mutate(&mut set, &mut rng, 20);

            let sparse_set = set.sparse_set();
            for id in 0..ID_RANGE {
                let expected = sparse_set
                    .index_of(id)
                    .is_some_and(|index| sparse_set.packed()[index] == id);
                assert_eq!(sparse_set.is_assigned(id), expected);
            }
            for (index, &slot) in sparse_set.packed()[..sparse_set.count()].iter().enumerate() {
                if slot >= 0 {
                    assert_eq!(sparse_set.index_of(slot), Some(index));
                }
            }
        }
    }
}

// ============================================================================
// ROLLBACK LAW
// ============================================================================

#[test]
fn test_rollback_one_reproduces_previous_frame() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for packing in [Packing::Continuous, Packing::WithHoles] {
        let mut set = RewindableDataSet::new(DataSet::<u32>::new(8, packing), 16);

        for _ in 0..30 {
            set.save_frame();
            let expected = observe(&set);

            mutate(&mut set, &mut rng, 25);
            set.save_frame();

            assert_eq!(set.rollback(1), 1);
            assert_eq!(observe(&set), expected);
        }
    }
}

#[test]
fn test_rollback_zero_discards_unsaved_changes() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut set = RewindableDataSet::new(DataSet::<u32>::new(8, Packing::WithHoles), 4);

    mutate(&mut set, &mut rng, 40);
    set.save_frame();
    let saved = observe(&set);

    assert_eq!(set.rollback(0), 0);
    assert_eq!(observe(&set), saved);

    mutate(&mut set, &mut rng, 40);
    set.rollback(0);
    assert_eq!(observe(&set), saved);
}

#[test]
fn test_multi_frame_rollback_and_eviction() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let capacity = 6;
    let mut set = RewindableDataSet::new(DataSet::<u32>::new(4, Packing::Continuous), capacity);
    let mut history = Vec::new();

    for _ in 0..10 {
        mutate(&mut set, &mut rng, 15);
        set.save_frame();
        history.push(observe(&set));
    }
    assert_eq!(set.can_rollback_frames(), capacity - 1);

    assert_eq!(set.rollback(3), 3);
    assert_eq!(observe(&set), history[history.len() - 4]);

    // Only the frames still in the ring can be reached.
    assert_eq!(set.rollback(10), capacity - 4);
    assert_eq!(observe(&set), history[history.len() - capacity]);
    assert_eq!(set.can_rollback_frames(), 0);
}

#[test]
fn test_resimulation_overwrites_speculative_frames() {
    let mut set = RewindableSet::new(SparseSet::new(Packing::Continuous), 8);
    set.assign(1);
    set.save_frame();
    set.assign(2);
    set.save_frame();
    set.assign(3);
    set.save_frame();

    set.rollback(2);
    set.assign(9);
    set.save_frame();

    assert_eq!(set.can_rollback_frames(), 1);
    set.rollback(1);
    assert_eq!(set.ids().collect::<Vec<_>>(), vec![1]);
}
