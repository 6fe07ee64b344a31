//! Current-context pointers under arbitrary sequences of "make current".

use std::sync::Arc;
use std::time::Duration;

use plugin_config::{ConfigStore, Context, ContextType, NoopActiveResourceSync};
use proptest::prelude::*;
use tempfile::TempDir;

fn context_type() -> impl Strategy<Value = ContextType> {
    prop_oneof![
        Just(ContextType::Kubernetes),
        Just(ContextType::MissionControl),
        Just(ContextType::Tanzu),
    ]
}

fn step() -> impl Strategy<Value = (ContextType, u8)> {
    (context_type(), 0u8..3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_at_most_one_exclusive_current(steps in prop::collection::vec(step(), 1..8)) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::builder()
            .config_dir(dir.path())
            .lock_timeout(Duration::from_secs(5))
            .active_resource_sync(Arc::new(NoopActiveResourceSync))
            .build()
            .unwrap();

        for (context_type, n) in &steps {
            let name = format!("{context_type}-{n}");
            store
                .set_context(&Context::new(name.clone(), context_type.clone()), true)
                .unwrap();

            let current = store.get_all_current_contexts().unwrap();
            prop_assert_eq!(&current[context_type].name, &name);
            let exclusive = current
                .keys()
                .filter(|t| !t.is_always_coexistent())
                .count();
            prop_assert!(exclusive <= 1, "exclusive current types: {:?}", current.keys());
        }

        // Every context ever set still exists
        for (context_type, n) in &steps {
            let name = format!("{context_type}-{n}");
            let exists = store.context_exists(&name).unwrap();
            prop_assert!(exists, "context {} is missing", name);
        }

        let cfg = store.get_client_config().unwrap();
        prop_assert!(plugin_config::validate(&cfg).is_empty());
    }
}
