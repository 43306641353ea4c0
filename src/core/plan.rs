use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub title: &'static str,
    pub note: &'static str,
}

impl PlanEntry {
    pub const fn new(title: &'static str, note: &'static str) -> Self {
        Self { title, note }
    }
}

pub const TEST_PLAN: &[PlanEntry] = &[
    PlanEntry::new("HOME DIR. CONTENTS", "FILE(S) PRESENT IN HOME DIRECTORY"),
    PlanEntry::new("F/W_UPDATED FILE", "FIRMWARE_UPDATED FILE FOUND"),
    PlanEntry::new("MACHINE FILE-EXIST", "MACHINE FILE NOT FOUND"),
    PlanEntry::new(
        "MACHINE FILE-CONTENT",
        "FILE NOT READABLE OR EMPTY (OR FAILED DUE TO FILE NOT FOUND)",
    ),
    PlanEntry::new(
        "MACHINE TYPE",
        "MACHINE FILE / MACHINE TYPE MISMATCH (OR FAILED DUE TO FILE NOT FOUND)",
    ),
    PlanEntry::new("BUNDLE ID-EXIST", "NO BUNDLE ID MATCH"),
    PlanEntry::new(
        "BUNDLE ID-RESTORE",
        "RESTORE DID NOT COMPLETE (OR WAS NOT DONE)",
    ),
    PlanEntry::new("ROUTE DATABASE-EXIST", "NO DIRECTORY FOUND"),
    PlanEntry::new(
        "ROUTE DATABASE-OWN",
        "WRONG ROUTE DB OWNERSHIP (OR DIRECTORY NOT FOUND)",
    ),
    PlanEntry::new(
        "ROUTE DATABASE-CONTENT",
        "ROUTE DB DIRECTORY EMPTY (OR DIRECTORY NOT FOUND)",
    ),
    PlanEntry::new("ROUTE STORE-EXIST", "NO DIRECTORY FOUND"),
    PlanEntry::new(
        "ROUTE STORE-CONTENT",
        "DIRECTORY EMPTY (OR BAD FILE OWNERSHIP)",
    ),
    PlanEntry::new("ROUTE INDEX-EXIST", "NO DIRECTORY FOUND"),
    PlanEntry::new(
        "ROUTE INDEX-CONTENT",
        "DIRECTORY EMPTY (OR BAD FILE OWNERSHIP)",
    ),
    PlanEntry::new("CURRENT LINK-EXIST", "<CURRENT> SYMBOLIC LINK NOT FOUND"),
    PlanEntry::new(
        "CURRENT LINK-CONTENT",
        "<CURRENT> LINK IS EMPTY (OR LINK NOT FOUND)",
    ),
    PlanEntry::new("VER.ROBOT PARAMS-EXIST", "DIRECTORY NOT FOUND"),
    PlanEntry::new(
        "VER.ROBOT PARAMS-OWN",
        "BAD DIRECTORY OWNERSHIP (OR DIRECTORY NOT FOUND)",
    ),
    PlanEntry::new(
        "VER.ROBOT PARAMS-CONTENT",
        "DIRECTORY EMPTY (OR BAD FILE OWNERSHIP)",
    ),
    PlanEntry::new(
        "VER.ROBOT PARAMS-SUBDIR",
        "SUBDIRECTORY EMPTY (OR CONTAINS BAD FILE OWNERSHIP)",
    ),
];
