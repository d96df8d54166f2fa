//! Property-based tests over random add/delete/block sequences.
//!
//! After every batch the edge table must only hold valid pair shapes and
//! every cached `edge_count` must equal the edges its user owns.

use friendgraph::application_impl::{RealRelationshipService, RealUserService};
use friendgraph::application_port::{RelationError, RelationshipService, UserService};
use friendgraph::domain_model::{Edge, EdgeOutcome, EdgeState, NewUser, UserId};
use friendgraph::infra_memory::{MemoryEdgeRepo, MemoryStore, MemoryTables, MemoryTxManager, MemoryUserRepo};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;

use EdgeState::*;

const USERS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Delete,
    Block,
}

#[derive(Debug, Clone)]
struct Step {
    op: Op,
    /// Indexes into the user list; `USERS` names a user that does not exist.
    actor: usize,
    targets: Vec<usize>,
}

fn step() -> impl Strategy<Value = Step> {
    (
        prop_oneof![Just(Op::Add), Just(Op::Delete), Just(Op::Block)],
        0..=USERS,
        vec(0..=USERS, 1..4),
    )
        .prop_map(|(op, actor, targets)| Step {
            op,
            actor,
            // The request layer never lets an actor target themselves.
            targets: targets.into_iter().filter(|t| *t != actor).collect(),
        })
        .prop_filter("at least one target", |s| !s.targets.is_empty())
}

fn valid_pair(forward: Option<EdgeState>, backward: Option<EdgeState>) -> bool {
    matches!(
        (forward, backward),
        (None, None)
            | (Some(Accepted), Some(Accepted))
            | (Some(OutgoingRequest), Some(Invited))
            | (Some(Invited), Some(OutgoingRequest))
            | (Some(Blocked), None)
            | (None, Some(Blocked))
            | (Some(Blocked), Some(Blocked))
    )
}

fn check_invariants(t: &MemoryTables, users: &[UserId]) -> Result<(), TestCaseError> {
    for (i, a) in users.iter().enumerate() {
        for b in &users[i + 1..] {
            let forward = t.edge_state(*a, *b);
            let backward = t.edge_state(*b, *a);
            prop_assert!(
                valid_pair(forward, backward),
                "invalid pair {:?}/{:?}",
                forward,
                backward
            );
        }
        prop_assert_eq!(t.edge_count(*a), Some(t.owned_edges(*a) as i32));
        prop_assert!(t.edge_state(*a, *a).is_none());
    }
    Ok(())
}

fn rows(t: &MemoryTables) -> Vec<Edge> {
    t.edges().cloned().collect()
}

async fn run_steps(steps: Vec<Step>) -> Result<(), TestCaseError> {
    let store = MemoryStore::new();
    let tx_manager = Arc::new(MemoryTxManager::new(store.clone()));
    let user_service = RealUserService::new(
        Arc::new(MemoryUserRepo::new(store.clone())),
        tx_manager.clone(),
    );
    let relations =
        RealRelationshipService::new(Arc::new(MemoryEdgeRepo::new(store.clone())), tx_manager);

    let mut users = Vec::with_capacity(USERS);
    for i in 0..USERS {
        let id = user_service
            .create_user(NewUser::with_username(format!("user{i}")))
            .await
            .expect("create user");
        users.push(id);
    }
    let ghost = UserId::new();
    let id_of = |index: usize| users.get(index).copied().unwrap_or(ghost);

    for step in steps {
        let before = store.snapshot().await;
        let actor = id_of(step.actor);
        let targets: Vec<UserId> = step.targets.iter().map(|t| id_of(*t)).collect();

        let result = match step.op {
            Op::Add => relations.add_friends(actor, &targets).await,
            Op::Delete => relations.delete_friends(actor, &targets).await,
            Op::Block => relations.block_friends(actor, &targets).await,
        };
        let after = store.snapshot().await;

        match result {
            Ok(outcomes) => {
                prop_assert!(outcomes.len() <= targets.len());
                if actor == ghost {
                    prop_assert!(outcomes.iter().all(|(_, o)| *o == EdgeOutcome::NoOp));
                }
            }
            // A rejected batch leaves no trace.
            Err(RelationError::Inconsistent(_)) => prop_assert_eq!(rows(&before), rows(&after)),
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        }

        check_invariants(&after, &users)?;
        prop_assert!(
            after
                .edges()
                .all(|e| e.source_id != ghost && e.destination_id != ghost)
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Pair shapes and cached counts hold after any sequence of batches.
    #[test]
    fn random_batches_keep_graph_consistent(steps in vec(step(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(run_steps(steps))?;
    }
}

#[tokio::test]
async fn blocked_pairs_cannot_be_reinvited_by_the_blocked_side() {
    let steps = vec![
        Step { op: Op::Block, actor: 0, targets: vec![1] },
        Step { op: Op::Add, actor: 1, targets: vec![0] },
        Step { op: Op::Block, actor: 1, targets: vec![0] },
        Step { op: Op::Add, actor: 0, targets: vec![1] },
        Step { op: Op::Delete, actor: 1, targets: vec![0] },
    ];
    run_steps(steps).await.expect("invariants hold");
}

#[tokio::test]
async fn unknown_actor_never_writes_edges() {
    let steps = vec![
        Step { op: Op::Add, actor: USERS, targets: vec![0, 1] },
        Step { op: Op::Block, actor: USERS, targets: vec![2] },
        Step { op: Op::Delete, actor: USERS, targets: vec![0] },
    ];
    run_steps(steps).await.expect("invariants hold");
}
