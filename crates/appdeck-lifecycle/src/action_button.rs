//! Action buttons shown on an admin entity view.

use std::collections::HashMap;

use appdeck_storage::{Criteria, DynStorage};
use serde::Serialize;

use crate::entities::{ActionButtonEntity, AppEntity};
use crate::error::LifecycleResult;
use crate::manifest::LocalizedString;
use crate::repository;

/// An action button as the admin renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButtonView {
    pub id: String,
    /// Name of the app that declared the button.
    pub app: String,
    pub action: String,
    pub label: LocalizedString,
    pub url: String,
    pub open_new_tab: bool,
}

#[derive(Clone)]
pub struct ActionButtonLoader {
    storage: DynStorage,
}

impl ActionButtonLoader {
    pub fn new(storage: DynStorage) -> Self {
        Self { storage }
    }

    /// Buttons declared for `entity` on `view`, ordered by app then action.
    pub async fn load_for_view(&self, entity: &str, view: &str) -> LifecycleResult<Vec<ActionButtonView>> {
        if entity.is_empty() || view.is_empty() {
            return Ok(Vec::new());
        }

        let criteria = Criteria::new()
            .with_equals("entity", entity)
            .with_equals("view", view);
        let buttons: Vec<ActionButtonEntity> =
            repository::search_committed(self.storage.as_ref(), &criteria).await?;
        if buttons.is_empty() {
            return Ok(Vec::new());
        }

        let app_ids: Vec<&str> = buttons.iter().map(|b| b.app_id.as_str()).collect();
        let app_names: HashMap<String, String> = repository::search_committed::<AppEntity>(
            self.storage.as_ref(),
            &Criteria::new().with_ids(app_ids),
        )
        .await?
        .into_iter()
        .filter_map(|app| app.id.map(|id| (id, app.name)))
        .collect();

        let mut views: Vec<ActionButtonView> = buttons
            .into_iter()
            .filter_map(|button| {
                let app = app_names.get(&button.app_id)?.clone();
                Some(ActionButtonView {
                    id: button.id?,
                    app,
                    action: button.action,
                    label: button.label,
                    url: button.url,
                    open_new_tab: button.open_new_tab,
                })
            })
            .collect();
        views.sort_by(|a, b| a.app.cmp(&b.app).then_with(|| a.action.cmp(&b.action)));
        Ok(views)
    }
}
