//! Collection title to artifact bucket.

use crate::content::{ContentItem, PortfolioDocument};

/// Where a collection's items land in the artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bucket {
	Branches,
	Stem,
	Career,
	Roots,
	Beliefs,
	/// Keyed by the collection's original title.
	Detailed(String),
}

/// Case-insensitive token match, first rule wins.
///
/// Only `branch` and `root` have English spellings; stem, career and beliefs
/// collections are recognised by their Korean names alone.
pub fn categorize(title: &str) -> Bucket {
	let t = title.to_lowercase();
	let has = |token: &str| t.contains(token);
	if has("가지") || has("branch") {
		Bucket::Branches
	} else if has("줄기") && has("경력") {
		Bucket::Career
	} else if has("줄기") {
		Bucket::Stem
	} else if has("뿌리") || has("root") {
		Bucket::Roots
	} else if has("신념") {
		Bucket::Beliefs
	} else {
		Bucket::Detailed(title.to_string())
	}
}

/// Append `items` to the bucket, keeping source order.
pub fn place(doc: &mut PortfolioDocument, bucket: Bucket, items: Vec<ContentItem>) {
	let target = match bucket {
		Bucket::Branches => &mut doc.branches,
		Bucket::Stem => &mut doc.stem,
		Bucket::Career => &mut doc.career,
		Bucket::Roots => &mut doc.roots,
		Bucket::Beliefs => &mut doc.beliefs,
		Bucket::Detailed(key) => doc.detailed_portfolios.entry(key).or_default(),
	};
	target.extend(items);
}
