//! Spreadsheet gateway: the boundary to the remote document store.
//!
//! The sync adapter only talks to a [`SheetGateway`]. Production uses
//! [`GoogleSheets`]; tests and offline runs use [`MemorySheets`].

mod google;
mod memory;

pub use google::GoogleSheets;
pub use memory::MemorySheets;

use crate::errors::AppResult;
use serde::{Deserialize, Serialize};

/// Identity of one sheet (tab) inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    /// Remote numeric id of the sheet.
    pub sheet_id: i64,
    /// Sheet title; equals the job name it is bound to.
    pub title: String,
}

/// Document metadata: its title and the list of sheets it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub sheets: Vec<SheetInfo>,
}

impl DocumentInfo {
    /// Exact, case-sensitive title lookup.
    pub fn sheet_by_title(&self, title: &str) -> Option<&SheetInfo> {
        self.sheets.iter().find(|s| s.title == title)
    }

    /// Record a sheet created by this process, keeping titles unique.
    pub fn remember(&mut self, sheet: SheetInfo) {
        if self.sheet_by_title(&sheet.title).is_none() {
            self.sheets.push(sheet);
        }
    }
}

/// Operations the sync adapter needs from the remote document.
///
/// Implementations must be `Send + Sync` for use across request tasks and
/// carry no business logic.
#[async_trait::async_trait]
pub trait SheetGateway: Send + Sync {
    /// Load document metadata (title and sheet list).
    async fn load_info(&self) -> AppResult<DocumentInfo>;

    /// Create a sheet titled `title` whose first row is `header`.
    async fn add_sheet(&self, title: &str, header: &[String]) -> AppResult<SheetInfo>;

    /// Read the header row of an existing sheet. Empty if the sheet has none.
    async fn header_row(&self, sheet: &SheetInfo) -> AppResult<Vec<String>>;

    /// Overwrite the first row of `sheet` with `header`.
    async fn write_header(&self, sheet: &SheetInfo, header: &[String]) -> AppResult<()>;

    /// Append rows after the last non-empty row of the sheet.
    async fn append_rows(&self, sheet: &SheetInfo, rows: &[Vec<String>]) -> AppResult<()>;
}
