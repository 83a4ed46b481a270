//! MCP server integration tests.
//!
//! Tests are organized by tool group:
//! - Status tools: orientation at the start of work
//! - Feature tools: checklist changes
//! - Progress tools: the log and checkpoints

use std::sync::Arc;

use agent_harness::config::HarnessConfig;
use agent_harness::mcp::HarnessMcpServer;
use agent_harness::models::*;
use agent_harness::project::Project;
use agent_harness::store::{FeatureStore, ProgressLog};
use agent_harness::vcs::{CommitOutcome, CommitSummary, VcsError, VersionControl};
use rmcp::ServerHandler;

struct NoChanges;

impl VersionControl for NoChanges {
    fn recent_commits(&self, _n: usize) -> Result<Vec<CommitSummary>, VcsError> {
        Ok(Vec::new())
    }

    fn has_uncommitted_changes(&self) -> Result<bool, VcsError> {
        Ok(false)
    }

    fn commit(&self, _message: &str) -> Result<CommitOutcome, VcsError> {
        Ok(CommitOutcome::NothingToCommit)
    }
}

/// Helper to create a test MCP server over in-memory stores.
fn setup() -> (HarnessMcpServer, Project) {
    let project = Project::with_stores(
        "/work/app",
        FeatureStore::open_memory(),
        ProgressLog::open_memory(),
        HarnessConfig::default(),
    );
    let server = HarnessMcpServer::new(project.clone(), Arc::new(NoChanges));
    (server, project)
}

// ============================================================
// Status Tools Tests
// ============================================================

mod status_tools {
    use super::*;

    mod get_status {
        use super::*;

        #[test]
        fn reports_empty_project() {
            let (server, _project) = setup();

            let text = server.test_get_status();
            assert!(text.contains("no features tracked yet"));
            assert!(text.contains("no progress logged yet"));
        }

        #[test]
        fn lists_unfinished_features() {
            let (server, project) = setup();
            project.features().add("Login", "Sign in").expect("Add failed");

            let text = server.test_get_status();
            assert!(text.contains("Next priority: #1 Login"));
            assert!(text.contains("[FAILING] #1 Login: Sign in"));
        }
    }

    mod next_feature {
        use super::*;

        #[test]
        fn returns_null_when_everything_passes() {
            let (server, project) = setup();
            project.features().add("Login", "").expect("Add failed");
            project
                .features()
                .transition(1, FeatureStatus::Passing)
                .expect("Transition failed");

            let response = server.test_next_feature().expect("Tool failed");
            assert!(response.feature.is_none());
        }

        #[test]
        fn returns_earliest_unfinished_feature() {
            let (server, project) = setup();
            project.features().add("Login", "").expect("Add failed");
            project.features().add("Search", "").expect("Add failed");
            project
                .features()
                .transition(1, FeatureStatus::Passing)
                .expect("Transition failed");

            let response = server.test_next_feature().expect("Tool failed");
            assert_eq!(response.feature.expect("Expected a feature").id, 2);
        }
    }

    #[test]
    fn server_info_advertises_tools() {
        let (server, _project) = setup();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "agent-harness");
        assert!(info.capabilities.tools.is_some());
    }
}

// ============================================================
// Feature Tools Tests
// ============================================================

mod feature_tools {
    use super::*;

    mod add_feature {
        use super::*;

        #[test]
        fn creates_failing_feature() {
            let (server, _project) = setup();

            let feature = server
                .test_add_feature("Login", Some("Email and password"))
                .expect("Tool failed");

            assert_eq!(feature.id, 1);
            assert_eq!(feature.status, "failing");
            assert_eq!(feature.description, "Email and password");
        }

        #[test]
        fn rejects_empty_name() {
            let (server, project) = setup();

            assert!(server.test_add_feature("", None).is_err());
            assert!(project.features().list().expect("List failed").is_empty());
        }
    }

    mod set_status {
        use super::*;

        #[test]
        fn start_and_pass_log_progress() {
            let (server, project) = setup();
            server.test_add_feature("Login", None).expect("Add failed");

            let started = server
                .test_set_status(1, FeatureStatus::InProgress)
                .expect("Start failed");
            assert_eq!(started.status, "in_progress");

            let passed = server
                .test_set_status(1, FeatureStatus::Passing)
                .expect("Pass failed");
            assert_eq!(passed.status, "passing");

            let log: Vec<_> = project
                .progress()
                .all()
                .expect("All failed")
                .into_iter()
                .map(|e| e.to_string())
                .collect();
            assert_eq!(log, vec!["started: Login", "completed: Login"]);
        }

        #[test]
        fn fail_logs_a_note() {
            let (server, project) = setup();
            server.test_add_feature("Login", None).expect("Add failed");
            server
                .test_set_status(1, FeatureStatus::Failing)
                .expect("Fail failed");

            let last = project.progress().latest().expect("Read failed").expect("No entry");
            assert_eq!(last.entry_type, EntryType::Note);
            assert_eq!(last.message, "Login needs more work");
        }

        #[test]
        fn unknown_feature_is_invalid_params() {
            let (server, project) = setup();

            assert!(server.test_set_status(99, FeatureStatus::Passing).is_err());
            assert!(project.progress().all().expect("All failed").is_empty());
        }
    }

    mod list_features {
        use super::*;

        #[test]
        fn filters_by_status() {
            let (server, project) = setup();
            server.test_add_feature("Login", None).expect("Add failed");
            server.test_add_feature("Search", None).expect("Add failed");
            project
                .features()
                .transition(2, FeatureStatus::InProgress)
                .expect("Transition failed");

            let all = server.test_list_features(None).expect("Tool failed");
            assert_eq!(all.features.len(), 2);

            let in_progress = server
                .test_list_features(Some("in_progress"))
                .expect("Tool failed");
            assert_eq!(in_progress.features.len(), 1);
            assert_eq!(in_progress.features[0].name, "Search");
        }

        #[test]
        fn rejects_unknown_status() {
            let (server, _project) = setup();
            assert!(server.test_list_features(Some("done")).is_err());
        }
    }
}

// ============================================================
// Progress Tools Tests
// ============================================================

mod progress_tools {
    use super::*;

    #[test]
    fn log_progress_appends_entry() {
        let (server, project) = setup();

        let entry = server
            .test_log_progress("blocker", "CI is red")
            .expect("Tool failed");
        assert_eq!(entry.entry_type, "blocker");

        let latest = project.progress().latest().expect("Read failed").expect("No entry");
        assert_eq!(latest.entry_type, EntryType::Blocker);
        assert_eq!(latest.message, "CI is red");
    }

    #[test]
    fn log_progress_rejects_unknown_type() {
        let (server, project) = setup();
        assert!(server.test_log_progress("done", "x").is_err());
        assert!(project.progress().all().expect("All failed").is_empty());
    }

    #[test]
    fn read_progress_respects_limit() {
        let (server, _project) = setup();
        for i in 0..3 {
            server
                .test_log_progress("note", &format!("note {}", i))
                .expect("Tool failed");
        }

        let response = server.test_read_progress(Some(2)).expect("Tool failed");
        let messages: Vec<_> = response.entries.into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["note 1", "note 2"]);
    }

    #[test]
    fn checkpoint_with_clean_tree() {
        let (server, project) = setup();

        let response = server.test_checkpoint("Wrap up").expect("Tool failed");
        assert!(!response.committed);
        assert!(response.commit_hash.is_none());

        let latest = project.progress().latest().expect("Read failed").expect("No entry");
        assert_eq!(latest.entry_type, EntryType::Checkpoint);
    }
}
