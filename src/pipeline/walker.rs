//! Depth-first block tree resolution.

use std::collections::HashSet;

use futures::future::BoxFuture;

use super::error::SourceError;
use super::notion::{ContentSource, RawBlock};

/// Block type that links a collection. Its rows are queried separately, so
/// the walker never descends into it.
pub const COLLECTION_BLOCK: &str = "child_database";

/// Every block under `root`, pre-order, each block id at most once.
///
/// Children are fetched page by page and a nested block's descendants follow
/// it immediately, before its next sibling.
pub async fn collect_blocks(source: &dyn ContentSource, root: &str) -> Result<Vec<RawBlock>, SourceError> {
	let mut visited = HashSet::new();
	let mut blocks = Vec::new();
	walk(source, root.to_string(), &mut visited, &mut blocks).await?;
	Ok(blocks)
}

fn walk<'a>(
	source: &'a dyn ContentSource,
	block_id: String,
	visited: &'a mut HashSet<String>,
	out: &'a mut Vec<RawBlock>,
) -> BoxFuture<'a, Result<(), SourceError>> {
	Box::pin(async move {
		let mut cursor: Option<String> = None;
		loop {
			let page = source.list_children(&block_id, cursor.as_deref()).await?;
			cursor = page.continuation().map(str::to_string);
			for block in page.results {
				if !visited.insert(block.id.clone()) {
					continue;
				}
				let descend = block.has_children && block.kind != COLLECTION_BLOCK;
				let child_id = block.id.clone();
				out.push(block);
				if descend {
					walk(source, child_id, visited, out).await?;
				}
			}
			if cursor.is_none() {
				return Ok(());
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::sync::Mutex;

	use async_trait::async_trait;
	use serde_json::json;

	use super::*;
	use crate::pipeline::notion::{Page, RawRecord};

	/// Children per parent, served two per page.
	#[derive(Default)]
	struct Tree {
		children: HashMap<String, Vec<RawBlock>>,
		calls: Mutex<Vec<String>>,
	}

	impl Tree {
		fn add(mut self, parent: &str, blocks: Vec<RawBlock>) -> Self {
			self.children.insert(parent.to_string(), blocks);
			self
		}
	}

	#[async_trait]
	impl ContentSource for Tree {
		async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<Page<RawBlock>, SourceError> {
			self.calls.lock().unwrap().push(block_id.to_string());
			let all = self.children.get(block_id).cloned().unwrap_or_default();
			let start: usize = cursor.map_or(0, |c| c.parse().unwrap());
			let end = (start + 2).min(all.len());
			Ok(Page {
				results: all[start..end].to_vec(),
				has_more: end < all.len(),
				next_cursor: Some(end.to_string()),
			})
		}

		async fn query_collection(&self, _: &str, _: Option<&str>) -> Result<Page<RawRecord>, SourceError> {
			unreachable!("walker never queries collections")
		}
	}

	fn para(id: &str) -> RawBlock {
		RawBlock::new(id, "paragraph", json!({"rich_text": []}))
	}

	#[tokio::test]
	async fn preorder_across_pages() {
		let tree = Tree::default()
			.add("root", vec![para("a").with_children(), para("b"), para("c")])
			.add("a", vec![para("a1"), para("a2"), para("a3")]);
		let ids: Vec<String> = collect_blocks(&tree, "root")
			.await
			.unwrap()
			.into_iter()
			.map(|b| b.id)
			.collect();
		assert_eq!(ids, ["a", "a1", "a2", "a3", "b", "c"]);
	}

	#[tokio::test]
	async fn transcluded_blocks_appear_once() {
		let tree = Tree::default()
			.add("root", vec![para("a").with_children(), para("b").with_children()])
			.add("a", vec![para("shared")])
			.add("b", vec![para("shared"), para("b1")]);
		let ids: Vec<String> = collect_blocks(&tree, "root")
			.await
			.unwrap()
			.into_iter()
			.map(|b| b.id)
			.collect();
		assert_eq!(ids, ["a", "shared", "b", "b1"]);
	}

	#[tokio::test]
	async fn collections_are_not_descended() {
		let db = RawBlock::new("db", COLLECTION_BLOCK, json!({"title": "Branches"})).with_children();
		let tree = Tree::default().add("root", vec![db]).add("db", vec![para("row")]);
		let blocks = collect_blocks(&tree, "root").await.unwrap();
		assert_eq!(blocks.len(), 1);
		assert_eq!(*tree.calls.lock().unwrap(), ["root"]);
	}
}
