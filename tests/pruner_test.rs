//! Tests for the pruning pipeline on realistic question parses

use generational_arena::Index;
use rstest::{fixture, rstest};

use depprune::domain::rules::remove_where;
use depprune::domain::{
    DomainError, EmptyTreePolicy, NodeData, OrphanModifierPolicy, Pruner, PrunerOptions, Stage,
    Token, TreeArena, TreeBuilder,
};
use depprune::util::testing;

/// (index, form, POS, head, deprel)
type Row<'a> = (usize, &'a str, &'a str, usize, &'a str);

fn build(rows: &[Row]) -> TreeArena {
    testing::init_test_setup();
    let tokens: Vec<Token> = rows
        .iter()
        .map(|&(index, form, pos_tag, head, dep_label)| Token {
            index,
            form: form.into(),
            pos_tag: pos_tag.into(),
            head,
            dep_label: dep_label.into(),
        })
        .collect();
    TreeBuilder::new().build(&tokens).expect("valid token table")
}

fn find(tree: &TreeArena, label: &str) -> Option<Index> {
    tree.iter()
        .find(|(_, node)| node.data.label == label)
        .map(|(idx, _)| idx)
}

fn child_labels(tree: &TreeArena, label: &str) -> Vec<String> {
    let idx = find(tree, label).expect("label present");
    tree.children(idx)
        .iter()
        .map(|&c| tree.data(c).unwrap().label.clone())
        .collect()
}

fn root_label(tree: &TreeArena) -> Option<String> {
    tree.root().map(|r| tree.data(r).unwrap().label.clone())
}

#[fixture]
fn pruner() -> Pruner {
    Pruner::default()
}

// ============================================================
// Removal stages
// ============================================================

#[rstest]
fn given_yes_no_question_when_pruning_then_drops_determiner_and_punctuation(pruner: Pruner) {
    // Did Katie Holmes win the award?
    let mut tree = build(&[
        (1, "Did", "VBD", 4, "aux"),
        (2, "Katie", "NNP", 3, "nn"),
        (3, "Holmes", "NNP", 4, "nsubj"),
        (4, "win", "VB", 0, "root"),
        (5, "the", "DT", 6, "det"),
        (6, "award", "NN", 4, "dobj"),
        (7, "?", ".", 4, "punct"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), vec!["win", "Did", "Holmes", "Katie", "award"]);
    assert_eq!(report.removed(Stage::Punctuation), 1);
    assert_eq!(report.removed(Stage::Determiner), 1);
    assert_eq!(report.nodes_before, 7);
    assert_eq!(report.nodes_after, 5);
    assert_eq!(report.depth_before, 3);
    assert_eq!(report.depth_after, 3);
}

#[rstest]
fn given_determiner_with_children_when_removing_then_children_take_its_place() {
    // win -> [Did, the -> [x, y], award]
    let mut tree = TreeArena::new();
    let win = tree.insert_node(NodeData::new("win", "VB", "root", 3), None);
    tree.insert_node(NodeData::new("Did", "VBD", "aux", 0), Some(win));
    let the = tree.insert_node(NodeData::new("the", "DT", "det", 4), Some(win));
    tree.insert_node(NodeData::new("x", "NN", "dep", 5), Some(the));
    tree.insert_node(NodeData::new("y", "NN", "dep", 6), Some(the));
    tree.insert_node(NodeData::new("award", "NN", "dobj", 7), Some(win));

    let predicate = Stage::Determiner.predicate().unwrap();
    let removed = remove_where(&mut tree, predicate, |_: &mut TreeArena, _| Ok(())).unwrap();

    assert_eq!(removed, 1);
    assert_eq!(child_labels(&tree, "win"), vec!["Did", "x", "y", "award"]);
    assert!(tree.validate().is_ok());
}

#[rstest]
fn given_punctuation_with_nested_children_when_pruning_then_splices_in_order(pruner: Pruner) {
    // a -> [b, . -> [c, . -> [d]], e]
    let mut tree = TreeArena::new();
    let a = tree.insert_node(NodeData::new("a", "VB", "root", 0), None);
    tree.insert_node(NodeData::new("b", "NN", "dep", 1), Some(a));
    let p1 = tree.insert_node(NodeData::new(",", ".", "punct", 2), Some(a));
    tree.insert_node(NodeData::new("c", "NN", "dep", 3), Some(p1));
    let p2 = tree.insert_node(NodeData::new(";", ".", "punct", 4), Some(p1));
    tree.insert_node(NodeData::new("d", "NN", "dep", 5), Some(p2));
    tree.insert_node(NodeData::new("e", "NN", "dep", 6), Some(a));

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(report.removed(Stage::Punctuation), 2);
    assert_eq!(child_labels(&tree, "a"), vec!["b", "c", "d", "e"]);
}

#[rstest]
fn given_passive_question_when_pruning_then_drops_auxpass_and_preposition(pruner: Pruner) {
    // In which country was Mahatma Gandhi born?
    let mut tree = build(&[
        (1, "In", "IN", 7, "prep"),
        (2, "which", "WDT", 3, "det"),
        (3, "country", "NN", 1, "pobj"),
        (4, "was", "VBD", 7, "auxpass"),
        (5, "Mahatma", "NNP", 6, "nn"),
        (6, "Gandhi", "NNP", 7, "nsubjpass"),
        (7, "born", "VBN", 0, "root"),
        (8, "?", ".", 7, "punct"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(
        tree.labels(),
        vec!["born", "country", "which", "Gandhi", "Mahatma"]
    );
    assert_eq!(report.removed(Stage::Preposition), 1);
    assert_eq!(report.removed(Stage::PassiveAuxiliary), 1);
    // WDT is not a determiner tag
    assert!(find(&tree, "which").is_some());
}

#[rstest]
fn given_predeterminer_when_pruning_then_removed(pruner: Pruner) {
    // List all the members of Prodigy.
    let mut tree = build(&[
        (1, "List", "VB", 0, "root"),
        (2, "all", "PDT", 4, "predet"),
        (3, "the", "DT", 4, "det"),
        (4, "members", "NNS", 1, "dobj"),
        (5, "of", "IN", 4, "prep"),
        (6, "Prodigy", "NNP", 5, "pobj"),
        (7, ".", ".", 1, "punct"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(report.removed(Stage::Predeterminer), 1);
    assert_eq!(report.removed(Stage::Interrogative), 1);
    assert_eq!(root_label(&tree).as_deref(), Some("members"));
    assert_eq!(tree.labels(), vec!["members", "Prodigy"]);
}

// ============================================================
// Modifier fold
// ============================================================

#[rstest]
fn given_adjective_under_noun_when_pruning_then_folds_label(pruner: Pruner) {
    // Which anti-apartheid activist was born in Africa?
    let mut tree = build(&[
        (1, "Which", "WDT", 3, "det"),
        (2, "anti-apartheid", "JJ", 3, "amod"),
        (3, "activist", "NN", 5, "nsubjpass"),
        (4, "was", "VBD", 5, "auxpass"),
        (5, "born", "VBN", 0, "root"),
        (6, "in", "IN", 5, "prep"),
        (7, "Africa", "NNP", 6, "pobj"),
        (8, "?", ".", 5, "punct"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(
        tree.labels(),
        vec!["born", "anti-apartheid activist", "Which", "Africa"]
    );
    assert_eq!(
        report.merged_modifiers,
        vec![(
            "anti-apartheid".to_string(),
            "anti-apartheid activist".to_string()
        )]
    );
    assert!(report.discarded_modifiers.is_empty());
}

#[rstest]
fn given_adjective_with_children_when_folding_then_children_move_to_noun(pruner: Pruner) {
    // activist(NN) -> anti-apartheid(JJ) -> very(RB)
    let mut tree = TreeArena::new();
    let activist = tree.insert_node(NodeData::new("activist", "NN", "root", 2), None);
    let jj = tree.insert_node(NodeData::new("anti-apartheid", "JJ", "amod", 1), Some(activist));
    tree.insert_node(NodeData::new("very", "RB", "advmod", 0), Some(jj));

    pruner.prune(&mut tree).unwrap();

    assert_eq!(root_label(&tree).as_deref(), Some("anti-apartheid activist"));
    assert_eq!(child_labels(&tree, "anti-apartheid activist"), vec!["very"]);
    assert_eq!(tree.len(), 2);
}

#[rstest]
fn given_stacked_adjectives_when_folding_then_prepends_in_visit_order(pruner: Pruner) {
    // Give me all large French cities.
    let mut tree = build(&[
        (1, "Give", "VB", 0, "root"),
        (2, "me", "PRP", 1, "iobj"),
        (3, "all", "DT", 6, "det"),
        (4, "large", "JJ", 6, "amod"),
        (5, "French", "JJ", 6, "amod"),
        (6, "cities", "NNS", 1, "dobj"),
        (7, ".", ".", 1, "punct"),
    ]);

    pruner.prune(&mut tree).unwrap();

    // Pre-order visits "large" first, so "French" ends up outermost
    assert_eq!(tree.labels(), vec!["French large cities"]);
}

#[rstest]
fn given_adjective_without_noun_when_discarding_then_label_is_dropped(pruner: Pruner) {
    // Is Frank Herbert still alive?
    let mut tree = build(&[
        (1, "Is", "VBZ", 0, "root"),
        (2, "Frank", "NNP", 3, "nn"),
        (3, "Herbert", "NNP", 1, "nsubj"),
        (4, "still", "RB", 5, "advmod"),
        (5, "alive", "JJ", 1, "acomp"),
        (6, "?", ".", 1, "punct"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), vec!["Is", "Herbert", "Frank", "still"]);
    assert_eq!(report.discarded_modifiers, vec!["alive".to_string()]);
    assert!(report.merged_modifiers.is_empty());
}

#[rstest]
fn given_adjective_without_noun_when_rejecting_then_errors() {
    let mut tree = build(&[
        (1, "Is", "VBZ", 0, "root"),
        (2, "Herbert", "NNP", 1, "nsubj"),
        (3, "alive", "JJ", 1, "acomp"),
    ]);
    let pruner = Pruner::new(PrunerOptions {
        orphan_modifier: OrphanModifierPolicy::Reject,
        ..PrunerOptions::default()
    });

    let result = pruner.prune(&mut tree);

    assert_eq!(
        result.unwrap_err(),
        DomainError::NoTargetAncestor {
            label: "alive".into(),
            source_index: 3
        }
    );
}

#[rstest]
fn given_orphan_after_merged_adjective_when_rejecting_then_tree_is_left_partially_pruned() {
    // Is -> [cats -> [big], alive]
    let mut tree = build(&[
        (1, "Is", "VBZ", 0, "root"),
        (2, "big", "JJ", 3, "amod"),
        (3, "cats", "NNS", 1, "nsubj"),
        (4, "alive", "JJ", 1, "acomp"),
    ]);
    let untouched = tree.clone();
    let pruner = Pruner::new(PrunerOptions {
        orphan_modifier: OrphanModifierPolicy::Reject,
        ..PrunerOptions::default()
    });

    let result = pruner.prune(&mut tree);

    assert!(matches!(result, Err(DomainError::NoTargetAncestor { .. })));
    assert_eq!(tree.labels(), vec!["Is", "big cats", "alive"]);
    assert_eq!(untouched.labels(), vec!["Is", "cats", "big", "alive"]);
}

#[rstest]
fn given_adjective_root_when_pruning_then_replaced_by_first_child(pruner: Pruner) {
    let mut tree = build(&[
        (1, "Big", "JJ", 0, "root"),
        (2, "cats", "NNS", 1, "nsubj"),
        (3, "dogs", "NNS", 1, "dobj"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), vec!["cats", "dogs"]);
    assert_eq!(report.discarded_modifiers, vec!["Big".to_string()]);
}

#[rstest]
fn given_custom_noun_tags_when_folding_then_uses_them() {
    let mut tree = build(&[
        (1, "red", "JJ", 2, "amod"),
        (2, "Rot", "FW", 0, "root"),
    ]);
    let pruner = Pruner::new(PrunerOptions {
        noun_tags: vec!["FW".into()],
        ..PrunerOptions::default()
    });

    pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), vec!["red Rot"]);
}

// ============================================================
// Interrogative boilerplate
// ============================================================

#[rstest]
fn given_give_me_when_pruning_then_object_becomes_root(pruner: Pruner) {
    let mut tree = build(&[
        (1, "Give", "VB", 0, "root"),
        (2, "me", "PRP", 1, "iobj"),
        (3, "award", "NN", 1, "dobj"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(root_label(&tree).as_deref(), Some("award"));
    assert_eq!(tree.len(), 1);
    assert_eq!(report.removed(Stage::Interrogative), 2);
}

#[rstest]
fn given_give_me_full_question_when_pruning_then_keeps_content_chain(pruner: Pruner) {
    // Give me all awards won by Katie Holmes.
    let mut tree = build(&[
        (1, "Give", "VB", 0, "root"),
        (2, "me", "PRP", 1, "iobj"),
        (3, "all", "DT", 4, "det"),
        (4, "awards", "NNS", 1, "dobj"),
        (5, "won", "VBN", 4, "partmod"),
        (6, "by", "IN", 5, "prep"),
        (7, "Katie", "NNP", 8, "nn"),
        (8, "Holmes", "NNP", 6, "pobj"),
        (9, ".", ".", 1, "punct"),
    ]);

    pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), vec!["awards", "won", "Holmes", "Katie"]);
    assert!(tree.validate().is_ok());
}

#[rstest]
fn given_list_root_when_pruning_then_siblings_become_children_of_new_root(pruner: Pruner) {
    let mut tree = build(&[
        (1, "List", "VB", 0, "root"),
        (2, "award", "NN", 1, "dobj"),
        (3, "winners", "NNS", 1, "dobj"),
    ]);

    pruner.prune(&mut tree).unwrap();

    assert_eq!(root_label(&tree).as_deref(), Some("award"));
    assert_eq!(child_labels(&tree, "award"), vec!["winners"]);
}

#[rstest]
fn given_list_root_when_new_root_has_children_then_order_is_restored(pruner: Pruner) {
    // List -> [award -> [Golden(5)], winners(3)]
    let mut tree = TreeArena::new();
    let list = tree.insert_node(NodeData::new("List", "VB", "root", 0), None);
    let award = tree.insert_node(NodeData::new("award", "NN", "dobj", 1), Some(list));
    tree.insert_node(NodeData::new("winners", "NNS", "dobj", 3), Some(list));
    tree.insert_node(NodeData::new("Golden", "NNP", "nn", 5), Some(award));

    pruner.prune(&mut tree).unwrap();

    assert_eq!(child_labels(&tree, "award"), vec!["winners", "Golden"]);
}

#[rstest]
fn given_give_without_me_when_pruning_then_root_stays(pruner: Pruner) {
    let mut tree = build(&[
        (1, "Give", "VB", 0, "root"),
        (2, "awards", "NNS", 1, "dobj"),
    ]);

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(root_label(&tree).as_deref(), Some("Give"));
    assert_eq!(report.removed(Stage::Interrogative), 0);
}

#[rstest]
fn given_only_give_me_when_pruning_then_tree_is_empty(pruner: Pruner) {
    let mut tree = build(&[(1, "Give", "VB", 0, "root"), (2, "me", "PRP", 1, "iobj")]);

    let report = pruner.prune(&mut tree).unwrap();

    assert!(tree.is_empty());
    assert!(report.is_empty_result());
    assert!(tree.validate().is_ok());
}

#[rstest]
fn given_only_give_me_when_rejecting_empty_then_errors() {
    let mut tree = build(&[(1, "Give", "VB", 0, "root"), (2, "me", "PRP", 1, "iobj")]);
    let pruner = Pruner::new(PrunerOptions {
        empty_tree: EmptyTreePolicy::Reject,
        ..PrunerOptions::default()
    });

    assert_eq!(pruner.prune(&mut tree).unwrap_err(), DomainError::EmptyResult);
}

#[rstest]
fn given_empty_tree_when_pruning_then_noop(pruner: Pruner) {
    let mut tree = TreeArena::new();
    let report = pruner.prune(&mut tree).unwrap();
    assert_eq!(report.nodes_before, 0);
    assert_eq!(report.stages.len(), Stage::PIPELINE.len());
}

// ============================================================
// Idempotence
// ============================================================

#[rstest]
fn given_pruned_tree_when_pruning_again_then_nothing_changes(pruner: Pruner) {
    let mut tree = build(&[
        (1, "Which", "WDT", 3, "det"),
        (2, "famous", "JJ", 3, "amod"),
        (3, "writers", "NNS", 4, "nsubj"),
        (4, "live", "VBP", 0, "root"),
        (5, "in", "IN", 4, "prep"),
        (6, "the", "DT", 7, "det"),
        (7, "Netherlands", "NNP", 5, "pobj"),
        (8, "?", ".", 4, "punct"),
    ]);
    pruner.prune(&mut tree).unwrap();
    let first = tree.labels();

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(tree.labels(), first);
    assert_eq!(report.nodes_before, report.nodes_after);
}

// ============================================================
// Deep trees
// ============================================================

/// A single chain `w0 -> w1 -> ...`; every third node is a determiner.
fn chain(len: usize) -> TreeArena {
    let mut tree = TreeArena::new();
    let mut parent = None;
    for i in 0..len {
        let pos_tag = if i % 3 == 1 { "DT" } else { "NN" };
        parent = Some(tree.insert_node(NodeData::new(format!("w{i}"), pos_tag, "dep", i), parent));
    }
    tree
}

#[rstest]
fn given_chain_of_100k_nodes_when_pruning_then_completes_without_recursion(pruner: Pruner) {
    testing::init_test_setup();
    let mut tree = chain(100_000);
    let determiners = (0..100_000).filter(|i| i % 3 == 1).count();

    let report = pruner.prune(&mut tree).unwrap();

    assert_eq!(report.removed(Stage::Determiner), determiners);
    assert_eq!(report.depth_before, 100_000);
    assert_eq!(tree.len(), 100_000 - determiners);
    assert_eq!(tree.depth(), tree.len());
    assert!(tree.validate().is_ok());
}

#[rstest]
fn given_deep_chain_when_removing_one_stage_then_splices_every_level() {
    let mut tree = chain(100_000);
    let predicate = Stage::Determiner.predicate().unwrap();

    let removed = remove_where(&mut tree, predicate, |_: &mut TreeArena, _| Ok(())).unwrap();

    assert_eq!(removed, (0..100_000).filter(|i| i % 3 == 1).count());
    assert_eq!(tree.depth(), tree.len());
    assert!(tree.iter().all(|(_, node)| node.data.pos_tag != "DT"));
}
