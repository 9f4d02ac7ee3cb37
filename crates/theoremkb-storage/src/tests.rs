//! Knowledge-base load/save and merge tests

use super::*;
use serde_json::json;
use tempfile::tempdir;
use theoremkb_model::StatementKind;

const SOURCE: &str = r"
\begin{lemma}\label{lem:main}
Every group has an identity.
\end{lemma}

\begin{theorem}
Follows from $\cref{lem:main}$.
\end{theorem}
";

fn kb_with_paper() -> KnowledgeBase {
    let mut kb = KnowledgeBase::default();
    kb.merge_paper(
        json!({ "paper_id": "groups", "title": "On Groups", "original_tex": SOURCE }),
        &TexPipeline::default(),
    )
    .unwrap();
    kb
}

#[test]
fn test_missing_file_loads_empty_with_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let kb = KnowledgeBase::load(&path).unwrap();
    assert!(kb.is_empty());
    assert_eq!(kb.kb_path.as_deref(), Some(path.as_path()));
    assert_eq!(kb.extraction_dir, PathBuf::from(DEFAULT_EXTRACTION_DIR));
    assert!(kb.load_warning().unwrap().contains("absent.json"));
}

#[test]
fn test_invalid_json_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    std::fs::write(&path, "[1, 2").unwrap();
    assert!(matches!(
        KnowledgeBase::load(&path),
        Err(StorageError::Parse { .. })
    ));
}

#[test]
fn test_save_and_reload_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");

    let mut kb = kb_with_paper();
    kb.resolve_all(Some("/pages"));
    let written = kb.save(Some(&path)).unwrap();
    assert_eq!(written, path);

    let loaded = KnowledgeBase::load(&path).unwrap();
    assert!(loaded.load_warning().is_none());
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.papers(), kb.papers());
    assert!(loaded.paper("groups").unwrap().is_resolved());
}

#[test]
fn test_save_without_path_fails() {
    let kb = KnowledgeBase::default();
    assert!(matches!(kb.save(None), Err(StorageError::NoPath)));
}

#[test]
fn test_save_uses_own_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("own.json");
    let kb = KnowledgeBase::create(Some(path.clone()), Some(dir.path().join("work")));
    assert_eq!(kb.save(None).unwrap(), path);
    assert!(path.exists());
}

#[test]
fn test_merge_rejects_duplicate_ids() {
    let mut kb = kb_with_paper();
    let err = kb
        .merge_paper(
            json!({ "paper_id": "groups", "original_tex": "" }),
            &TexPipeline::default(),
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicatePaper(id) if id == "groups"));
    assert_eq!(kb.len(), 1);
}

#[test]
fn test_merge_requires_source() {
    let mut kb = KnowledgeBase::default();
    let err = kb
        .merge_paper(json!({ "paper_id": "x" }), &TexPipeline::default())
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Paper(PaperError::MissingSource { .. })
    ));

    let err = kb
        .merge_paper(
            json!({ "paper_id": "y", "original_tex": "  \n" }),
            &TexPipeline::default(),
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::Paper(PaperError::MissingSource { .. })));
    assert!(kb.is_empty());
}

#[test]
fn test_merge_rejects_malformed_record() {
    let mut kb = KnowledgeBase::default();
    let err = kb
        .merge_paper(json!({ "year": "not a number" }), &TexPipeline::default())
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidPaper(_)));
}

#[test]
fn test_resolve_all_links_references() {
    let mut kb = kb_with_paper();
    let stats = kb.resolve_all(None);
    assert_eq!(stats.linked, 1);

    let paper = kb.paper("groups").unwrap();
    let theorem = &paper.statements().of_kind(StatementKind::Theorem)[0];
    assert_eq!(
        theorem.statement_html,
        r#"<p>Follows from <a href="groups/lemma-1.html#lem%3Amain">Lemma 1</a>.</p>"#
    );
}

#[test]
fn test_merge_rejects_inconsistent_statements() {
    let mut kb = KnowledgeBase::default();
    let pipeline = TexPipeline::default();

    let misplaced = json!({
        "paper_id": "bad",
        "original_tex": "x",
        "processed_original_tex": "x",
        "statements": {
            "definitions": [
                { "statement_id": "t1", "statement_type": "theorem", "statement_original_tex": "T" }
            ]
        }
    });
    assert!(matches!(
        kb.merge_paper(misplaced, &pipeline),
        Err(StorageError::InvalidPaper(_))
    ));

    let axiom_with_proof = json!({
        "paper_id": "bad",
        "original_tex": "x",
        "statements": {
            "axioms": [{
                "statement_id": "a1",
                "statement_type": "axiom",
                "statement_original_tex": "A",
                "proof": { "statement_id": "a1-proof", "statement_original_tex": "pf" }
            }]
        }
    });
    assert!(matches!(
        kb.merge_paper(axiom_with_proof, &pipeline),
        Err(StorageError::InvalidPaper(_))
    ));
    assert!(kb.is_empty());
}

#[test]
fn test_load_rejects_inconsistent_statements() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    let contents = json!({
        "papers": [{
            "paper_id": "p",
            "statements": {
                "lemmas": [
                    { "statement_id": "s", "statement_type": "lemma", "statement_original_tex": "a" },
                    { "statement_id": "s", "statement_type": "lemma", "statement_original_tex": "b" }
                ]
            }
        }]
    });
    std::fs::write(&path, contents.to_string()).unwrap();
    assert!(matches!(
        KnowledgeBase::load(&path),
        Err(StorageError::Parse { .. })
    ));
}

#[test]
fn test_undecodable_file_is_an_error_and_left_intact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    let mut bytes = br#"{"papers":[{"paper_id":"keep","title":"caf"#.to_vec();
    bytes.extend_from_slice(&[0xE9]);
    bytes.extend_from_slice(br#""}]}"#);
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        KnowledgeBase::load(&path),
        Err(StorageError::Io { .. })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}
