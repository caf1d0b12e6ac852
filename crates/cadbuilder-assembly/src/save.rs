//! Bulk save of a project's scene state.

use std::collections::HashSet;

use cadbuilder_ir::{ItemId, ProjectId};
use cadbuilder_math::{rotation_to_xyzw, Pose};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::AssemblyResult;
use crate::store::Store;

/// One entry of a save payload. Missing fields keep their current value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    /// Item to update. Entries without an id are skipped.
    #[serde(default)]
    pub id: Option<ItemId>,
    /// New local position.
    #[serde(default)]
    pub position: Option<[f64; 3]>,
    /// New local rotation `[x, y, z, w]`.
    #[serde(default)]
    pub rotation: Option<[f64; 4]>,
    /// New local scale.
    #[serde(default)]
    pub scale: Option<[f64; 3]>,
    /// New name override.
    #[serde(default)]
    pub custom_name: Option<String>,
}

impl ItemUpdate {
    /// Update entry for `id` with every field left unchanged.
    pub fn keep(id: ItemId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

/// Outcome of [`Store::save_project`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveReport {
    /// Items whose pose or name was written.
    pub updated: usize,
    /// Items removed, cascaded descendants included.
    pub deleted: usize,
    /// Entries ignored: missing, duplicate or unknown ids.
    pub skipped: usize,
    /// Per-item failures such as rejected poses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Store {
    /// Synchronize a project with a client's scene.
    ///
    /// Listed items are updated, items missing from the payload are deleted.
    /// A non-empty payload that would delete every item is treated as a
    /// client error and deletes nothing. An explicitly empty payload clears
    /// the project. No items are created here.
    #[instrument(skip(self, updates), fields(entries = updates.len()))]
    pub fn save_project(
        &mut self,
        project: ProjectId,
        updates: Vec<ItemUpdate>,
    ) -> AssemblyResult<SaveReport> {
        let existing: Vec<ItemId> = self.project(project)?.items.iter().map(|i| i.id).collect();
        let requested: HashSet<ItemId> = updates.iter().filter_map(|u| u.id).collect();
        let to_delete: Vec<ItemId> = existing
            .iter()
            .copied()
            .filter(|id| !requested.contains(id))
            .collect();

        let mut report = SaveReport::default();

        if !to_delete.is_empty() {
            if to_delete.len() == existing.len() && !updates.is_empty() {
                warn!(
                    existing = existing.len(),
                    "payload matches no existing item, deletion aborted"
                );
            } else {
                for id in to_delete {
                    // Earlier removals may have cascaded to this one.
                    if self.project(project)?.item(id).is_some() {
                        report.deleted += self.remove_item(project, id)?.len();
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for update in updates {
            let Some(id) = update.id else {
                report.skipped += 1;
                warn!("save entry without id skipped");
                continue;
            };
            if !seen.insert(id) {
                report.skipped += 1;
                warn!(item = id, "duplicate id in save payload");
                continue;
            }
            let p = self.project_mut(project)?;
            let Some(item) = p.item_mut(id) else {
                report.skipped += 1;
                warn!(item = id, "unknown item in save payload");
                continue;
            };

            let current = item.pose;
            let pose = Pose::new(
                update.position.unwrap_or_else(|| current.position().into()),
                update
                    .rotation
                    .unwrap_or_else(|| rotation_to_xyzw(&current.rotation())),
                update.scale.unwrap_or_else(|| current.scale().into()),
            );
            match pose {
                Ok(pose) => {
                    item.pose = pose;
                    if update.custom_name.is_some() {
                        item.custom_name = update.custom_name;
                    }
                    report.updated += 1;
                }
                Err(err) => report.errors.push(format!("item {id}: {err}")),
            }
        }

        self.project_mut(project)?.touch();
        info!(
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            "save completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewItem, NewProject};
    use cadbuilder_ir::CategoryLabel;
    use cadbuilder_math::Vec3;

    fn scene(n: usize) -> (Store, ProjectId, Vec<ItemId>) {
        let mut store = Store::new();
        let comp = store
            .add_component("plate", "plate.glb", CategoryLabel::Base, None)
            .unwrap();
        let project = store.create_project(NewProject {
            name: "scene".into(),
            ..Default::default()
        });
        let items = (0..n)
            .map(|_| store.add_item(project, NewItem::new(comp)).unwrap())
            .collect();
        (store, project, items)
    }

    fn ids(store: &Store, project: ProjectId) -> Vec<ItemId> {
        store.project(project).unwrap().items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn updates_listed_and_deletes_missing() {
        let (mut store, project, items) = scene(3);
        let report = store
            .save_project(
                project,
                vec![
                    ItemUpdate {
                        position: Some([1.0, 2.0, 3.0]),
                        ..ItemUpdate::keep(items[0])
                    },
                    ItemUpdate::keep(items[2]),
                ],
            )
            .unwrap();
        assert_eq!(
            report,
            SaveReport {
                updated: 2,
                deleted: 1,
                skipped: 0,
                errors: vec![]
            }
        );
        assert_eq!(ids(&store, project), vec![items[0], items[2]]);
        let pose = store.item(project, items[0]).unwrap().pose;
        assert_eq!(pose.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let (mut store, project, items) = scene(1);
        let start = Pose::new([5.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [2.0, 2.0, 2.0]).unwrap();
        store.update_pose(project, items[0], start).unwrap();
        store
            .save_project(
                project,
                vec![ItemUpdate {
                    scale: Some([1.0, 1.0, 1.0]),
                    ..ItemUpdate::keep(items[0])
                }],
            )
            .unwrap();
        let pose = store.item(project, items[0]).unwrap().pose;
        assert_eq!(pose.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(pose.rotation(), start.rotation());
        assert_eq!(pose.scale(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn all_unknown_ids_abort_deletion() {
        let (mut store, project, items) = scene(2);
        let report = store
            .save_project(project, vec![ItemUpdate::keep(777), ItemUpdate::keep(778)])
            .unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(ids(&store, project), items);
    }

    #[test]
    fn explicit_empty_payload_clears() {
        let (mut store, project, _) = scene(3);
        let report = store.save_project(project, vec![]).unwrap();
        assert_eq!(report.deleted, 3);
        assert!(ids(&store, project).is_empty());
    }

    #[test]
    fn duplicates_and_missing_ids_skipped() {
        let (mut store, project, items) = scene(1);
        let report = store
            .save_project(
                project,
                vec![
                    ItemUpdate::keep(items[0]),
                    ItemUpdate::keep(items[0]),
                    ItemUpdate::default(),
                ],
            )
            .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.deleted, 0);
    }

    #[test]
    fn invalid_pose_reported_not_fatal() {
        let (mut store, project, items) = scene(2);
        let report = store
            .save_project(
                project,
                vec![
                    ItemUpdate {
                        rotation: Some([0.0; 4]),
                        ..ItemUpdate::keep(items[0])
                    },
                    ItemUpdate {
                        custom_name: Some("kept".into()),
                        ..ItemUpdate::keep(items[1])
                    },
                ],
            )
            .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with(&format!("item {}", items[0])));
        assert_eq!(store.item(project, items[1]).unwrap().custom_name.as_deref(), Some("kept"));
    }

    #[test]
    fn payload_parses_from_json() {
        let json = r#"[{"id": 4, "position": [1, 2, 3]}, {"rotation": [0, 0, 0, 1]}]"#;
        let updates: Vec<ItemUpdate> = serde_json::from_str(json).unwrap();
        assert_eq!(updates[0].id, Some(4));
        assert_eq!(updates[1].id, None);
    }
}
