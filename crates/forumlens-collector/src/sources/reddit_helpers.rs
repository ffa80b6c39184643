//! Reddit listing shapes and reply-tree flattening.

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{Comment, Submission};

/// Generic listing wrapper shared by search, comment and expansion responses.
#[derive(Debug, Deserialize)]
pub(super) struct Listing {
    pub(super) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingData {
    #[serde(default)]
    pub(super) children: Vec<Thing>,
    pub(super) after: Option<String>,
}

/// A listing child; `data` is decoded lazily once `kind` is known.
#[derive(Debug, Deserialize)]
pub(super) struct Thing {
    pub(super) kind: String,
    #[serde(default)]
    pub(super) data: Value,
}

#[derive(Debug, Deserialize)]
struct SubmissionData {
    id: String,
    title: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    num_comments: u64,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    body: Option<String>,
    author: Option<String>,
    score: Option<i64>,
    created_utc: Option<f64>,
    permalink: Option<String>,
    #[serde(default)]
    replies: Value,
}

/// Placeholder for collapsed replies.
///
/// A stub with child ids is expanded through `/api/morechildren`; one without
/// ids is a "continue this thread" link expanded by re-fetching the thread
/// rooted at `parent_id`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub(super) struct MoreStub {
    pub(super) id: String,
    #[serde(default)]
    pub(super) parent_id: String,
    #[serde(default)]
    pub(super) children: Vec<String>,
}

/// `/api/morechildren?api_type=json` response body.
#[derive(Debug, Deserialize)]
pub(super) struct MoreChildrenResponse {
    pub(super) json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub(super) struct MoreChildrenJson {
    #[serde(default)]
    pub(super) errors: Vec<Value>,
    pub(super) data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MoreChildrenData {
    #[serde(default)]
    pub(super) things: Vec<Thing>,
}

pub(super) fn to_submission(thing: &Thing) -> Option<Submission> {
    if thing.kind != "t3" {
        return None;
    }
    let data: SubmissionData = serde_json::from_value(thing.data.clone()).ok()?;
    Some(Submission {
        id: data.id,
        title: data.title.unwrap_or_default(),
        permalink: data.permalink.unwrap_or_default(),
        num_comments: data.num_comments,
    })
}

/// Flatten a reply forest breadth-first.
///
/// Returns every decoded comment plus the collapsed-reply stubs still to be
/// expanded. Parent/child relationships are not kept.
pub(super) fn flatten_things(roots: Vec<Thing>) -> (Vec<Comment>, Vec<MoreStub>) {
    let mut comments = Vec::new();
    let mut stubs = Vec::new();
    let mut queue: VecDeque<Thing> = roots.into();

    while let Some(thing) = queue.pop_front() {
        match thing.kind.as_str() {
            "t1" => {
                let Ok(data) = serde_json::from_value::<CommentData>(thing.data) else {
                    tracing::debug!("skipping undecodable comment node");
                    continue;
                };
                if let Ok(replies) = serde_json::from_value::<Listing>(data.replies) {
                    queue.extend(replies.data.children);
                }
                comments.push(Comment {
                    id: data.id,
                    body: data.body.unwrap_or_default(),
                    author: data.author,
                    score: data.score.unwrap_or(0),
                    created_utc: data.created_utc.unwrap_or(0.0),
                    permalink: data.permalink.unwrap_or_default(),
                });
            }
            "more" => {
                if let Ok(stub) = serde_json::from_value::<MoreStub>(thing.data) {
                    stubs.push(stub);
                }
            }
            _ => {}
        }
    }

    (comments, stubs)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn comment(id: &str, replies: Value) -> Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "body": format!("body {id}"),
                "author": "someone",
                "score": 3,
                "created_utc": 1_700_000_000.0,
                "permalink": format!("/r/x/comments/s1/t/{id}/"),
                "replies": replies
            }
        })
    }

    fn things(values: Vec<Value>) -> Vec<Thing> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("thing"))
            .collect()
    }

    #[test]
    fn flattens_breadth_first() {
        let nested = json!({"kind": "Listing", "data": {"children": [comment("c", json!(""))], "after": null}});
        let roots = things(vec![comment("a", nested), comment("b", json!(""))]);

        let (comments, stubs) = flatten_things(roots);
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(stubs.is_empty());
    }

    #[test]
    fn collects_more_stubs_from_any_depth() {
        let nested = json!({"kind": "Listing", "data": {"children": [
            {"kind": "more", "data": {"id": "_", "parent_id": "t1_a", "children": [], "count": 0}}
        ], "after": null}});
        let roots = things(vec![
            comment("a", nested),
            json!({"kind": "more", "data": {"id": "m1", "parent_id": "t3_s1", "children": ["x", "y"], "count": 2}}),
        ]);

        let (comments, stubs) = flatten_things(roots);
        assert_eq!(comments.len(), 1);
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].children, vec!["x", "y"]);
        assert!(stubs[1].children.is_empty());
        assert_eq!(stubs[1].parent_id, "t1_a");
    }

    #[test]
    fn missing_score_and_author_are_tolerated() {
        let roots = things(vec![json!({"kind": "t1", "data": {"id": "z", "replies": ""}})]);
        let (comments, _) = flatten_things(roots);
        assert_eq!(comments[0].score, 0);
        assert!(comments[0].author.is_none());
        assert_eq!(comments[0].body, "");
    }

    #[test]
    fn to_submission_ignores_other_kinds() {
        let t3: Thing = serde_json::from_value(json!({
            "kind": "t3",
            "data": {"id": "s1", "title": "Best kettle?", "permalink": "/r/x/comments/s1/best/", "num_comments": 12}
        }))
        .unwrap();
        let t1: Thing = serde_json::from_value(comment("a", json!(""))).unwrap();

        let submission = to_submission(&t3).expect("submission");
        assert_eq!(submission.id, "s1");
        assert_eq!(submission.num_comments, 12);
        assert_eq!(submission.fullname(), "t3_s1");
        assert!(to_submission(&t1).is_none());
    }
}
