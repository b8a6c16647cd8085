//! # Registry Rollback Tests
//!
//! Resimulation through the registry with blittable, managed and tag kinds,
//! and registries built from TOML configuration.

use rewind_core::{Packing, PayloadKind, Registry, RegistryConfig, StorageError};

#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Health {
    current: u32,
    max: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Inventory {
    items: Vec<String>,
}

struct Stunned;

fn registry(config: RegistryConfig) -> Registry {
    let mut registry = Registry::new(config).unwrap();
    registry.register_data::<Health>(false).unwrap();
    registry.register_managed::<Inventory>(true).unwrap();
    registry.register_tag::<Stunned>(false).unwrap();
    registry
}

fn inventory(items: &[&str]) -> Inventory {
    Inventory {
        items: items.iter().map(|item| (*item).to_owned()).collect(),
    }
}

#[test]
fn test_managed_payloads_are_deep_copied() {
    let mut registry = registry(RegistryConfig::default());
    registry.insert(1, inventory(&["sword"])).unwrap();
    registry.insert(2, inventory(&["shield", "rope"])).unwrap();
    registry.save_frame();

    registry.get_mut::<Inventory>(1).unwrap().items.push("torch".to_owned());
    registry.get_mut::<Inventory>(2).unwrap().items.clear();
    let inventory_set = registry.set_id::<Inventory>().unwrap();
    registry.unassign(inventory_set, 1).unwrap();

    registry.rollback(0);

    assert_eq!(registry.get::<Inventory>(1), Some(&inventory(&["sword"])));
    assert_eq!(registry.get::<Inventory>(2), Some(&inventory(&["shield", "rope"])));
    assert_eq!(
        registry.data::<Inventory>().unwrap().payload_kind(),
        PayloadKind::Managed
    );
}

#[test]
fn test_step_by_step_resimulation() {
    let mut registry = registry(RegistryConfig::default());
    let stunned = registry.set_id::<Stunned>().unwrap();
    let mut history = Vec::new();

    for step in 0..8_u32 {
        registry.insert(step as i32, Health { current: step, max: 10 }).unwrap();
        if step % 2 == 0 {
            registry.assign(stunned, step as i32).unwrap();
        }
        if step == 5 {
            registry.unassign(stunned, 2).unwrap();
        }
        registry.save_frame();

        let snapshot: Vec<(Option<Health>, bool)> = (0..8)
            .map(|id| (registry.get::<Health>(id).copied(), registry.is_assigned(stunned, id)))
            .collect();
        history.push(snapshot);
    }

    for frames in [1, 2, 3] {
        let target = history.len() - 1 - frames;
        assert_eq!(registry.rollback(frames), frames);
        history.truncate(target + 1);

        let restored: Vec<(Option<Health>, bool)> = (0..8)
            .map(|id| (registry.get::<Health>(id).copied(), registry.is_assigned(stunned, id)))
            .collect();
        assert_eq!(restored, history[target]);
    }
    assert_eq!(registry.can_rollback_frames(), 1);
}

#[test]
fn test_clear_keeps_frames() {
    let mut registry = registry(RegistryConfig::default());
    for id in 0..20 {
        registry.insert(id, Health { current: 1, max: 1 }).unwrap();
    }
    registry.save_frame();

    registry.clear();
    assert_eq!(registry.data::<Health>().unwrap().count(), 0);

    registry.rollback(0);
    assert_eq!(registry.data::<Health>().unwrap().count(), 20);
}

#[test]
fn test_tags_as_data_sets() {
    let config = RegistryConfig {
        store_empty_types_as_data_sets: true,
        ..RegistryConfig::default()
    };
    let mut registry = registry(config);
    let stunned = registry.set_id::<Stunned>().unwrap();

    registry.assign(stunned, 4).unwrap();
    registry.save_frame();
    registry.unassign(stunned, 4).unwrap();
    registry.rollback(0);

    assert!(registry.is_assigned(stunned, 4));
    assert!(matches!(
        registry.data::<Health>().map(|health| health.count()),
        Ok(0)
    ));
    assert!(matches!(
        registry.insert(4, 1_u8),
        Err(StorageError::UnknownSet(_))
    ));
}

#[test]
fn test_registry_from_toml() {
    let path = std::env::temp_dir().join(format!("rewind_core_config_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        frames_capacity = 3
        page_size = 64
        default_packing = "with_holes"
        "#,
    )
    .unwrap();

    let config = RegistryConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut registry = registry(config);
    let health = registry.set_id::<Health>().unwrap();
    assert!(registry.set(health).unwrap().is_empty());
    assert_eq!(registry.set(health).unwrap().packing(), Packing::WithHoles);

    for step in 0..6 {
        registry.insert(step, Health::default()).unwrap();
        registry.save_frame();
    }
    assert_eq!(registry.can_rollback_frames(), 2);
    assert_eq!(registry.rollback(5), 2);
}
