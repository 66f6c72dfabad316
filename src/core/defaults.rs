//! Compiled defaults: the pipeline and manifest a fresh install runs with.
//!
//! These encode the original scaffolding's contract. Operators override the
//! pipeline via `dockhand pipeline set`; the manifest names are the external
//! contract of downstream tooling and are not configurable.

use crate::config::{Pipeline, DEFAULT_PIPELINE_ID};
use crate::environment::{EnvVarSpec, Manifest, ValueShape};
use crate::trigger::TriggerRule;

/// Built-in build command. Placeholders are filled per action.
pub const DEFAULT_BUILD_COMMAND_TEMPLATE: &str =
    "docker build -f {{buildFile}} -t {{image}}:{{tag}} .";

pub const GROUP_TEST_DB: &str = "test-database";
pub const GROUP_REGISTRY: &str = "registry";
pub const GROUP_API_KEYS: &str = "api-keys";
pub const GROUP_CLOUD_BACKEND: &str = "cloud-backend";
pub const GROUP_APP: &str = "app";

pub fn default_pipeline() -> Pipeline {
    Pipeline {
        id: DEFAULT_PIPELINE_ID.to_string(),
        image: "local/app".to_string(),
        build_file: "Dockerfile".to_string(),
        registry: None,
        build_command_template: None,
        rules: vec![
            TriggerRule::new("main", "main"),
            TriggerRule::new("develop", "dev"),
            TriggerRule::new("test-actions", "test-actions"),
        ],
    }
}

pub fn default_manifest() -> Manifest {
    let vars = vec![
        // Test database connection for the suite that runs before deploys.
        EnvVarSpec::secret("DT_SQL_TESTUSER", GROUP_TEST_DB),
        EnvVarSpec::secret("DT_SQL_TESTPASS", GROUP_TEST_DB),
        EnvVarSpec::setting("DT_SQL_TESTHOST", GROUP_TEST_DB, "localhost", ValueShape::Text),
        EnvVarSpec::setting("DT_SQL_TESTPORT", GROUP_TEST_DB, "5432", ValueShape::Port),
        EnvVarSpec::setting(
            "DT_SQL_TESTDBNAME",
            GROUP_TEST_DB,
            "dtbase_testdb",
            ValueShape::Text,
        ),
        // Container registry credentials consumed by login.
        EnvVarSpec::secret("DT_DOCKER_USER", GROUP_REGISTRY),
        EnvVarSpec::secret("DT_DOCKER_PASS", GROUP_REGISTRY),
        // Third-party API keys.
        EnvVarSpec::secret("DT_OPENWEATHERMAP_APIKEY", GROUP_API_KEYS),
        EnvVarSpec::secret("DT_HYPER_APIKEY", GROUP_API_KEYS),
        // Cloud storage backend holding remote state.
        EnvVarSpec::secret("AZURE_STORAGE_ACCOUNT", GROUP_CLOUD_BACKEND),
        EnvVarSpec::secret("AZURE_STORAGE_KEY", GROUP_CLOUD_BACKEND),
        EnvVarSpec::setting(
            "AZURE_KEYVAULT_AUTH_VIA_CLI",
            GROUP_CLOUD_BACKEND,
            "true",
            ValueShape::Boolean,
        ),
        // Application settings.
        EnvVarSpec::setting("DT_CONFIG_MODE", GROUP_APP, "Production", ValueShape::Text),
    ];

    // The built-in set has unique names by construction.
    Manifest::new(vars).expect("default manifest is valid")
}
