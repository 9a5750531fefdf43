//! Schema migrations shipped with the application.
//!
//! Append new steps at the end of [`BUILTIN_STEPS`] with a version later than
//! every existing entry. Never edit or reorder a shipped step: installs that
//! already applied it will not run it again.

mod add_layout_sidebar_section_state;
mod add_tab_layout;
mod drop_viewer_record_cache;
mod normalize_search_history;
mod rename_search_bar_pinned;

use crate::registry::MigrationStep;

pub const BUILTIN_STEPS: &[MigrationStep] = &[
    MigrationStep::new(
        202005261032,
        "normalizeSearchHistory",
        normalize_search_history::migrate,
    ),
    MigrationStep::new(202006011205, "addTabLayout", add_tab_layout::migrate),
    MigrationStep::new(
        202006231303,
        "addLayoutSidebarSectionState",
        add_layout_sidebar_section_state::migrate,
    ),
    MigrationStep::new(
        202007151127,
        "renameSearchBarPinned",
        rename_search_bar_pinned::migrate,
    ),
    MigrationStep::new(
        202007221420,
        "dropViewerRecordCache",
        drop_viewer_record_cache::migrate,
    ),
];
