mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use threadline_core::domain::frontmatter::PropertyValue;
use threadline_core::{
    CreatedNote, FrontmatterMutation, GraphBuilder, MetadataAccessor, StoreMetadataAccessor,
    ThreadConfig, ThreadError, ThreadGraph, ThreadWorkspace,
};
use threadline_store::{DocumentStore, DocumentStoreError, InMemoryDocumentStore};

fn first_note() -> String {
    format!("threads/{}.md", FIRST_ID)
}

fn second_note() -> String {
    format!("threads/{}.md", SECOND_ID)
}

async fn workspace_over(store: &InMemoryDocumentStore) -> ThreadWorkspace {
    let workspace = ThreadWorkspace::new(Arc::new(store.clone()), config()).with_clock(fixed_clock());
    workspace.rebuild().await.unwrap();
    workspace
}

#[tokio::test]
async fn test_append_at_end_of_thread() {
    let store = seeded_store(&[("A.md", "# Start\n")]).await;
    let workspace = workspace_over(&store).await;
    let service = workspace.insertion_service();

    let context = service.build_insertion_context(&p("A.md")).await.unwrap();
    assert!(context.is_append);
    assert_eq!(context.next_path, None);
    assert_eq!(context.source_title, "A");

    let created = service.create_note(&context).await.unwrap();
    assert_eq!(
        created,
        CreatedNote {
            path: p(&first_note()),
            title: FIRST_ID.to_string(),
        }
    );

    let mutations = service.calculate_mutations(&context, &created).await.unwrap();
    assert!(mutations.is_empty());

    service.apply_mutations(&mutations).await.unwrap();
    service.update_graph(&context, &created).await;

    assert_eq!(
        store.read(&first_note()).await.unwrap(),
        "---\nprev: \"[[A]]\"\nmain_thread: true\n---\n"
    );
    assert_eq!(store.read("A.md").await.unwrap(), "# Start\n");

    let graph = workspace.graph();
    let graph = graph.read().await;
    assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&p(&first_note())));
    assert_eq!(graph.get_prev(&p(&first_note())), Some(&p("A.md")));
    assert!(graph.is_main(&p(&first_note())));
}

#[tokio::test]
async fn test_insert_mid_chain_repoints_successor() {
    let store = seeded_store(&[("A.md", ""), ("B.md", &with_prev("A"))]).await;
    let workspace = workspace_over(&store).await;
    let service = workspace.insertion_service();

    let context = service.build_insertion_context(&p("A.md")).await.unwrap();
    assert!(!context.is_append);
    assert_eq!(context.next_path, Some(p("B.md")));

    let created = service.create_note(&context).await.unwrap();
    let mutations = service.calculate_mutations(&context, &created).await.unwrap();
    assert_eq!(
        mutations,
        vec![FrontmatterMutation {
            target: p("B.md"),
            property: "prev".to_string(),
            value: PropertyValue::Text(format!("[[{}]]", FIRST_ID)),
        }]
    );

    service.apply_mutations(&mutations).await.unwrap();
    service.update_graph(&context, &created).await;

    assert_eq!(
        store.read("B.md").await.unwrap(),
        format!("---\nprev: \"[[{}]]\"\n---\n", FIRST_ID)
    );

    let graph = workspace.graph();
    let graph = graph.read().await;
    let n = p(&first_note());
    assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&n));
    assert_eq!(graph.get_main_continuation(&n), Some(&p("B.md")));
    assert_eq!(graph.get_prev(&p("B.md")), Some(&n));
    assert_eq!(
        graph.get_full_thread(&p("B.md")).unwrap(),
        vec![p("A.md"), n.clone(), p("B.md")]
    );
}

#[tokio::test]
async fn test_insert_at_fork_leaves_replies_alone() {
    let reply_text = format!("{}Reply body\n", with_prev_main("A", false));
    let store = seeded_store(&[
        ("A.md", ""),
        ("B.md", &with_prev_main("A", true)),
        ("R.md", &reply_text),
    ])
    .await;
    let workspace = workspace_over(&store).await;

    let created = workspace.insert_after(&p("A.md")).await.unwrap();

    assert_eq!(store.read("R.md").await.unwrap(), reply_text);
    assert_eq!(
        store.read("B.md").await.unwrap(),
        format!("---\nprev: \"[[{}]]\"\nmain_thread: true\n---\n", FIRST_ID)
    );

    let graph = workspace.graph();
    let graph = graph.read().await;
    assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&created.path));
    assert_eq!(graph.get_replies(&p("A.md")), vec![p("R.md")]);
    assert_eq!(graph.get_prev(&p("R.md")), Some(&p("A.md")));
    assert_eq!(graph.get_main_continuation(&created.path), Some(&p("B.md")));
}

#[tokio::test]
async fn test_insert_at_fork_with_two_marked_successors() {
    let store = seeded_store(&[
        ("A.md", ""),
        ("B.md", &with_prev_main("A", true)),
        ("R.md", &with_prev_main("A", true)),
    ])
    .await;
    let workspace = workspace_over(&store).await;
    assert_eq!(
        workspace.graph().read().await.get_main_continuation(&p("A.md")),
        Some(&p("B.md"))
    );

    let created = workspace.insert_after(&p("A.md")).await.unwrap();

    let graph = workspace.graph();
    let graph = graph.read().await;
    assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&created.path));
    assert_eq!(graph.get_main_continuation(&created.path), Some(&p("B.md")));
    assert_eq!(graph.get_replies(&p("A.md")), vec![p("R.md")]);
    assert_eq!(
        graph.get_full_thread(&p("A.md")).unwrap(),
        vec![p("A.md"), created.path.clone(), p("B.md")]
    );
    assert_eq!(store.read("R.md").await.unwrap(), with_prev_main("A", true));
}

#[tokio::test]
async fn test_titled_source_links_by_basename() {
    let store = seeded_store(&[("A.md", "---\ntitle: Opening\n---\nBody\n")]).await;
    let workspace = workspace_over(&store).await;
    let service = workspace.insertion_service();

    let context = service.build_insertion_context(&p("A.md")).await.unwrap();
    assert_eq!(context.source_title, "Opening");

    let created = workspace.insert_after(&p("A.md")).await.unwrap();

    assert_eq!(
        store.read(created.path.as_str()).await.unwrap(),
        "---\nprev: \"[[A]]\"\nmain_thread: true\n---\n"
    );
    let graph = workspace.graph();
    assert_eq!(graph.read().await.get_prev(&created.path), Some(&p("A.md")));
}

#[tokio::test]
async fn test_incremental_update_matches_rebuild() {
    let store = seeded_store(&[
        ("A.md", ""),
        ("B.md", &with_prev_main("A", true)),
        ("C.md", &with_prev("B")),
        ("R.md", &with_prev_main("A", false)),
    ])
    .await;
    let workspace = workspace_over(&store).await;

    workspace.insert_after(&p("A.md")).await.unwrap();
    workspace.insert_after(&p("B.md")).await.unwrap();
    let incremental = workspace.thread_view(&p("C.md")).await.unwrap();

    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let accessor: Arc<dyn MetadataAccessor> = Arc::new(StoreMetadataAccessor::new(shared.clone(), &config()));
    let rebuilt = ThreadGraph::new().shared();
    GraphBuilder::new(shared, accessor, "md").build(&rebuilt).await.unwrap();
    let rebuilt = rebuilt.read().await;

    assert_eq!(
        incremental.thread,
        vec![
            p("A.md"),
            p(&first_note()),
            p("B.md"),
            p(&second_note()),
            p("C.md"),
        ]
    );
    assert_eq!(rebuilt.get_full_thread(&p("C.md")).unwrap(), incremental.thread);
    assert_eq!(rebuilt.get_replies(&p("A.md")), vec![p("R.md")]);
}

#[tokio::test]
async fn test_identifier_collision_advances_clock() {
    let store = seeded_store(&[("A.md", "")]).await;
    let workspace = workspace_over(&store).await;

    let first = workspace.insert_after(&p("A.md")).await.unwrap();
    let second = workspace.insert_after(&first.path).await.unwrap();

    assert_eq!(first.title, FIRST_ID);
    assert_eq!(second.title, SECOND_ID);
    assert_eq!(second.path, p(&second_note()));
    assert_eq!(
        store.read(&second_note()).await.unwrap(),
        format!("---\nprev: \"[[{}]]\"\nmain_thread: true\n---\n", FIRST_ID)
    );
}

#[tokio::test]
async fn test_creates_notes_folder_when_missing() {
    let store = seeded_store(&[("A.md", "")]).await;
    assert!(!store.exists("threads").await.unwrap());

    let workspace = workspace_over(&store).await;
    workspace.insert_after(&p("A.md")).await.unwrap();

    assert!(store.exists("threads").await.unwrap());
    assert!(store.exists(&first_note()).await.unwrap());
}

#[tokio::test]
async fn test_notes_folder_can_be_vault_root() {
    let store = seeded_store(&[("A.md", "")]).await;
    let config = ThreadConfig {
        notes_folder: String::new(),
        ..ThreadConfig::default()
    };
    let workspace = ThreadWorkspace::new(Arc::new(store.clone()), config).with_clock(fixed_clock());
    workspace.rebuild().await.unwrap();

    let created = workspace.insert_after(&p("A.md")).await.unwrap();

    assert_eq!(created.path, p(&format!("{}.md", FIRST_ID)));
}

#[tokio::test]
async fn test_ambiguous_source_uses_path_link() {
    let store = seeded_store(&[("a/Same.md", ""), ("b/Same.md", "")]).await;
    let workspace = workspace_over(&store).await;

    let created = workspace.insert_after(&p("a/Same.md")).await.unwrap();

    assert_eq!(
        store.read(created.path.as_str()).await.unwrap(),
        "---\nprev: \"[[a/Same]]\"\nmain_thread: true\n---\n"
    );

    workspace.rebuild().await.unwrap();
    let graph = workspace.graph();
    assert_eq!(graph.read().await.get_prev(&created.path), Some(&p("a/Same.md")));
}

#[tokio::test]
async fn test_custom_property_names() {
    let store = seeded_store(&[
        ("A.md", ""),
        ("B.md", "---\nparent: \"[[A]]\"\nstatus: draft\n---\nBody\n"),
    ])
    .await;
    let config = ThreadConfig {
        prev_property: "parent".to_string(),
        main_thread_property: "spine".to_string(),
        ..ThreadConfig::default()
    };
    let workspace = ThreadWorkspace::new(Arc::new(store.clone()), config).with_clock(fixed_clock());
    workspace.rebuild().await.unwrap();

    let created = workspace.insert_after(&p("A.md")).await.unwrap();

    assert_eq!(
        store.read(created.path.as_str()).await.unwrap(),
        "---\nparent: \"[[A]]\"\nspine: true\n---\n"
    );
    assert_eq!(
        store.read("B.md").await.unwrap(),
        format!("---\nparent: \"[[{}]]\"\nstatus: draft\n---\nBody\n", FIRST_ID)
    );
}

#[tokio::test]
async fn test_notifies_only_on_success() {
    let store = seeded_store(&[("A.md", "")]).await;
    let counter = NotifyCounter::default();
    let workspace = ThreadWorkspace::new(Arc::new(store.clone()), config())
        .with_clock(fixed_clock())
        .with_notifier(counter.callback());

    workspace.rebuild().await.unwrap();
    assert_eq!(counter.count(), 1);

    workspace.insert_after(&p("A.md")).await.unwrap();
    assert_eq!(counter.count(), 2);

    let err = workspace.insert_after(&p("Nowhere.md")).await.unwrap_err();
    assert!(matches!(err, ThreadError::Storage(DocumentStoreError::NotFound(_))));
    assert_eq!(counter.count(), 2);
}

#[tokio::test]
async fn test_unknown_source_creates_nothing() {
    let store = seeded_store(&[("A.md", "")]).await;
    let workspace = workspace_over(&store).await;

    assert!(workspace.insert_after(&p("Nowhere.md")).await.is_err());

    assert_eq!(store.list_all().await.unwrap(), vec!["A.md".to_string()]);
    assert_eq!(workspace.graph().read().await.len(), 1);
}

#[tokio::test]
async fn test_failed_mutation_keeps_created_note() {
    let inner = seeded_store(&[("A.md", ""), ("B.md", &with_prev("A"))]).await;
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let counter = NotifyCounter::default();
    let workspace = ThreadWorkspace::new(flaky.clone(), config())
        .with_clock(fixed_clock())
        .with_notifier(counter.callback());
    workspace.rebuild().await.unwrap();
    flaky.fail_writes.store(true, Ordering::SeqCst);

    let err = workspace.insert_after(&p("A.md")).await.unwrap_err();

    assert!(matches!(err, ThreadError::Storage(DocumentStoreError::BackendError(_))));
    assert_eq!(counter.count(), 1);
    assert!(inner.exists(&first_note()).await.unwrap());
    assert_eq!(inner.read("B.md").await.unwrap(), with_prev("A"));
    {
        let graph = workspace.graph();
        let graph = graph.read().await;
        assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&p("B.md")));
        assert!(!graph.has_node(&p(&first_note())));
    }

    // A rebuild reflects what actually reached storage
    workspace.rebuild().await.unwrap();
    let graph = workspace.graph();
    let graph = graph.read().await;
    assert_eq!(graph.get_main_continuation(&p("A.md")), Some(&p(&first_note())));
    assert_eq!(graph.get_replies(&p("A.md")), vec![p("B.md")]);
}

#[tokio::test]
async fn test_failed_create_changes_nothing() {
    let inner = seeded_store(&[("A.md", "")]).await;
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    flaky.fail_creates.store(true, Ordering::SeqCst);
    let workspace = ThreadWorkspace::new(flaky, config()).with_clock(fixed_clock());
    workspace.rebuild().await.unwrap();

    assert!(workspace.insert_after(&p("A.md")).await.is_err());

    assert!(!inner.exists(&first_note()).await.unwrap());
    let graph = workspace.graph();
    assert_eq!(graph.read().await.get_main_continuation(&p("A.md")), None);
}
