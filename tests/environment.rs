// tests/environment.rs

use std::collections::HashMap;
use std::sync::OnceLock;

use proptest::prelude::*;
use proc_interact::{ProcessError, ProcessExecutor};

fn runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build test runtime")
    })
}

fn executor() -> ProcessExecutor {
    ProcessExecutor::with_runtime(runtime().handle().clone())
}

#[test]
fn empty_map_is_accepted() {
    let mut executor = executor();
    executor
        .set_environment(HashMap::<String, String>::new())
        .expect("empty environment should be accepted");
    assert!(executor.environment().is_empty());
}

proptest! {
    #[test]
    fn non_empty_values_are_accepted(
        env in proptest::collection::hash_map("[A-Z_]{1,8}", "[a-z0-9]{1,8}", 1..8)
    ) {
        let mut executor = executor();
        prop_assert!(executor.set_environment(env.clone()).is_ok());
        prop_assert_eq!(executor.environment(), &env);
    }

    #[test]
    fn any_empty_value_is_rejected_and_previous_environment_kept(
        env in proptest::collection::hash_map("[A-Z_]{1,8}", "[a-z0-9]{1,8}", 0..8),
        bad_key in "[a-z]{1,8}",
    ) {
        let mut executor = executor();
        executor.set_environment([("KEEP", "me")]).expect("valid environment");

        let mut env = env;
        env.insert(bad_key, String::new());

        let result = executor.set_environment(env);
        prop_assert!(matches!(result, Err(ProcessError::Config(_))));
        prop_assert_eq!(executor.environment().get("KEEP").map(String::as_str), Some("me"));
        prop_assert_eq!(executor.environment().len(), 1);
    }
}
