use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use runlens::fs::mock::MockFileSystem;
use runlens::fs::{now_ms, RealFileSystem};
use runlens::provider::{
    Collapsible, ItemContext, OpenTarget, PipelineRunContext, RunEvent, RunsProvider,
};
use runlens::tree::{Node, NodeRole, FAILURE_GLYPH};
use runlens_test_utils::builders::{
    mock_provider, provider_over, write_task, MockRun, TaskFixture,
};
use runlens_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

fn populated_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    let run = MockRun::new(&fs, "/store/hello/run_1");
    run.task(TaskFixture::new("ab", "cd123456").label("sayHello (1)").exit(0).modified(2_000));
    run.task(TaskFixture::new("ab", "ef567890").label("sayHello (2)").exit(1).modified(500));
    run.file("trace.txt", "task_id\n");
    fs.add_file("/store/hello/settings.json", "{}");
    fs
}

async fn root(provider: &RunsProvider, name: &str) -> Result<Node, Box<dyn Error>> {
    provider
        .get_children(None)
        .await
        .into_iter()
        .find(|n| n.name == name)
        .ok_or_else(|| format!("pipeline {name} not listed").into())
}

#[tokio::test]
async fn roots_list_only_pipelines_with_a_folder() -> TestResult {
    init_tracing();
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store"), ("ghost", "/store")]);

    let roots = provider.get_children(None).await;
    assert_eq!(names(&roots), vec!["hello"]);
    assert_eq!(roots[0].role, NodeRole::Pipeline);
    assert_eq!(roots[0].path, Some(PathBuf::from("/store/hello")));
    Ok(())
}

#[tokio::test]
async fn pipeline_children_come_from_the_cached_tree() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    assert!(provider.cache().is_empty());
    let runs = provider.get_children(Some(&hello)).await;
    assert_eq!(names(&runs), vec!["run_1"]);
    assert_eq!(provider.cache().len(), 1);

    let calls = fs.read_dir_calls();
    let again = provider.get_children(Some(&hello)).await;
    assert_eq!(names(&again), vec!["run_1"]);
    assert_eq!(fs.read_dir_calls(), calls);
    Ok(())
}

#[tokio::test]
async fn run_folders_are_decorated_until_toggled() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;
    let run = provider.get_children(Some(&hello)).await.remove(0);

    assert!(provider.is_decorated());
    let decorated = provider.get_children(Some(&run)).await;
    assert_eq!(names(&decorated), vec!["sayHello", "trace.txt"]);

    assert!(!provider.toggle_decorated());
    let raw = provider.get_children(Some(&run)).await;
    assert_eq!(names(&raw), vec!["ab", "trace.txt"]);

    assert!(provider.toggle_decorated());
    assert_eq!(provider.cache().len(), 1);
    Ok(())
}

#[tokio::test]
async fn refresh_rebuilds_from_disk() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;
    assert_eq!(provider.get_children(Some(&hello)).await.len(), 1);

    MockRun::new(&fs, "/store/hello/run_2")
        .task(TaskFixture::new("aa", "bb0000").label("sayHello (1)").exit(0));

    // Still served from the cache.
    assert_eq!(provider.get_children(Some(&hello)).await.len(), 1);

    provider.refresh(Some("hello"));
    assert!(provider.cache().is_empty());
    let runs = provider.get_children(Some(&hello)).await;
    assert_eq!(names(&runs), vec!["run_1", "run_2"]);
    Ok(())
}

#[tokio::test]
async fn refresh_all_drops_every_tree() -> TestResult {
    let fs = populated_fs();
    MockRun::new(&fs, "/store/other/run_1");
    let provider = mock_provider(&fs, &[("hello", "/store"), ("other", "/store")]);

    for name in ["hello", "other"] {
        let node = root(&provider, name).await?;
        provider.get_children(Some(&node)).await;
    }
    assert_eq!(provider.cache().len(), 2);

    provider.refresh(None);
    assert!(provider.cache().is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_expands_share_one_build() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    let before = fs.read_dir_calls();
    let (a, b) = tokio::join!(
        provider.get_children(Some(&hello)),
        provider.get_children(Some(&hello))
    );
    let one_flight = fs.read_dir_calls() - before;
    assert_eq!(names(&a), names(&b));

    provider.refresh(Some("hello"));
    let before = fs.read_dir_calls();
    provider.get_children(Some(&hello)).await;
    let single = fs.read_dir_calls() - before;

    assert!(single > 0);
    assert_eq!(one_flight, single);
    Ok(())
}

#[tokio::test]
async fn resumed_run_ignores_failures_from_the_previous_attempt() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let earlier = now_ms() - 60_000;
    let run = MockRun::new(&fs, "/store/hello/run_1");
    run.task(TaskFixture::new("ab", "cd123456").label("sayHello (1)").exit(1).modified(earlier));
    // The pipeline folder is older than anything inside it.
    fs.set_modified("/store/hello", earlier - 60_000);
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    // Before any run is observed, every task counts.
    let run_node = provider.get_children(Some(&hello)).await.remove(0);
    let groups = provider.get_children(Some(&run_node)).await;
    assert_eq!(groups[0].note.as_deref(), Some(FAILURE_GLYPH));

    let before = now_ms();
    provider.handle_event(&RunEvent::Started {
        pipeline: "hello".into(),
    });
    let ctx = provider.pipeline("hello").ok_or("pipeline missing")?;
    assert!(ctx.run_started_at_ms() >= before);
    assert!(provider.cache().is_empty());

    // The resumed run reuses run_1 and only adds a successful task.
    run.task(
        TaskFixture::new("ef", "567890ab")
            .label("sayHello (2)")
            .exit(0)
            .modified(ctx.run_started_at_ms() + 1_000),
    );
    provider.run_updated("hello");

    let run_node = provider.get_children(Some(&hello)).await.remove(0);
    let groups = provider.get_children(Some(&run_node)).await;
    assert_eq!(groups[0].name, "sayHello");
    assert_eq!(groups[0].children().len(), 2);
    assert_eq!(groups[0].note, None);
    Ok(())
}

#[tokio::test]
async fn failures_after_the_start_still_mark_the_group() -> TestResult {
    let fs = MockFileSystem::new();
    let run = MockRun::new(&fs, "/store/hello/run_1");
    run.task(TaskFixture::new("ab", "cd123456").label("sayHello (1)").exit(0).modified(100));
    let provider = mock_provider(&fs, &[("hello", "/store")]);

    provider.run_started_at("hello", 1_000);
    run.task(TaskFixture::new("ef", "567890ab").label("sayHello (2)").exit(2).modified(1_500));
    provider.run_updated("hello");

    let hello = root(&provider, "hello").await?;
    let run_node = provider.get_children(Some(&hello)).await.remove(0);
    let groups = provider.get_children(Some(&run_node)).await;
    assert_eq!(groups[0].note.as_deref(), Some(FAILURE_GLYPH));
    Ok(())
}

#[tokio::test]
async fn resumed_run_on_disk_ignores_stale_failures() -> TestResult {
    let storage = tempfile::tempdir()?;
    let run_dir = storage.path().join("hello/run_1");
    write_task(&run_dir, &TaskFixture::new("ab", "cd123456").label("sayHello (1)").exit(1))?;

    let root_str = storage.path().to_str().ok_or("non-utf8 tempdir")?;
    let provider = provider_over(Arc::new(RealFileSystem), &[("hello", root_str)]);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    provider.run_started("hello");
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    write_task(&run_dir, &TaskFixture::new("ef", "567890ab").label("sayHello (2)").exit(0))?;
    provider.run_updated("hello");

    let hello = root(&provider, "hello").await?;
    let run_node = provider.get_children(Some(&hello)).await.remove(0);
    let groups = provider.get_children(Some(&run_node)).await;
    assert_eq!(groups[0].name, "sayHello");
    assert_eq!(groups[0].note, None);
    Ok(())
}

#[tokio::test]
async fn update_and_stop_events_invalidate() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    for event in [
        RunEvent::Updated { pipeline: "hello".into() },
        RunEvent::Stopped { pipeline: "hello".into() },
    ] {
        provider.get_children(Some(&hello)).await;
        assert_eq!(provider.cache().len(), 1);
        provider.handle_event(&event);
        assert!(provider.cache().is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn removed_pipeline_disappears_with_its_tree() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;
    provider.get_children(Some(&hello)).await;

    assert!(provider.remove_pipeline("hello"));
    assert!(!provider.remove_pipeline("hello"));
    assert!(provider.cache().is_empty());
    assert!(provider.get_children(None).await.is_empty());
    assert!(provider.get_children(Some(&hello)).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn added_pipeline_is_listed() -> TestResult {
    let fs = populated_fs();
    MockRun::new(&fs, "/data/late/run_1");
    let provider = mock_provider(&fs, &[("hello", "/store")]);

    provider.add_pipeline(PipelineRunContext::new("late", "/data"));
    assert_eq!(names(&provider.get_children(None).await), vec!["hello", "late"]);
    Ok(())
}

#[tokio::test]
async fn run_folders_are_noted_with_their_run_name() -> TestResult {
    let fs = populated_fs();
    fs.add_file(
        "/store/hello/run_1/.nextflow.log",
        "Jan-01 10:00:00.100 [main] DEBUG nextflow.Session - Run name: tiny_turing\n",
    );
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    let run = provider.get_children(Some(&hello)).await.remove(0);
    assert_eq!(run.note.as_deref(), Some("[tiny_turing]"));
    Ok(())
}

#[tokio::test]
async fn tree_items_and_open_targets() -> TestResult {
    let fs = populated_fs();
    let provider = mock_provider(&fs, &[("hello", "/store")]);
    let hello = root(&provider, "hello").await?;

    let item = provider.tree_item(&hello);
    assert_eq!(item.context, ItemContext::Pipeline);
    assert_eq!(item.collapsible, Collapsible::Collapsed);

    let run = provider.get_children(Some(&hello)).await.remove(0);
    let children = provider.get_children(Some(&run)).await;
    let group = &children[0];
    let group_item = provider.tree_item(group);
    assert_eq!(group_item.context, ItemContext::ProcessGroup);
    assert_eq!(group_item.collapsible, Collapsible::Expanded);
    assert_eq!(group_item.description.as_deref(), Some(FAILURE_GLYPH));
    assert_eq!(provider.open_target(group), None);

    let task = &group.children()[0];
    assert_eq!(provider.tree_item(task).context, ItemContext::ProcessFolder);
    assert_eq!(
        provider.open_target(task),
        Some(OpenTarget::OpenTerminal(PathBuf::from(
            "/store/hello/run_1/ab/cd123456"
        )))
    );

    let trace = &children[1];
    let trace_item = provider.tree_item(trace);
    assert_eq!(trace_item.context, ItemContext::File);
    assert_eq!(trace_item.collapsible, Collapsible::None);
    assert_eq!(
        provider.open_target(trace),
        Some(OpenTarget::ShowFile(PathBuf::from("/store/hello/run_1/trace.txt")))
    );
    Ok(())
}
