//! Card strip of the `branches` bucket, the first thing the site shows.

use leptos::prelude::*;
use log::debug;

use crate::content::PortfolioDocument;
use crate::navigation::{ContentLookup, ModalView, NavigationConfig, resolve_item};

#[component]
pub fn BranchesStrip(
	#[prop(into)] document: Signal<Option<PortfolioDocument>>,
	#[prop(into)] on_open: Callback<ModalView>,
) -> impl IntoView {
	let open = move |idx: usize| {
		let nav = NavigationConfig::default();
		let resolved = document.with_untracked(|doc| {
			let doc = doc.as_ref()?;
			let item = doc.branches.get(idx)?;
			resolve_item(&ContentLookup::new(doc), item, &nav)
		});
		match resolved {
			Some(view) => on_open.run(view),
			None => debug!("branches: card {idx} has nothing to show"),
		}
	};

	view! {
		<section class="branches">
			{move || {
				document
					.with(|doc| match doc {
						None => view! { <p class="branches-status">"불러오는 중..."</p> }.into_any(),
						Some(doc) if doc.branches.is_empty() => {
							view! { <p class="branches-status">"표시할 항목이 없습니다."</p> }.into_any()
						}
						Some(doc) => {
							view! {
								<div class="branches-track">
									{doc
										.branches
										.iter()
										.enumerate()
										.map(|(idx, item)| {
											let thumb = item.first_image().map(str::to_string);
											let title = item.title.trim().to_string();
											let description = item.description.clone();
											view! {
												<button class="branch-card" on:click=move |_| open(idx)>
													{thumb.map(|src| view! { <img src=src alt="" loading="lazy" /> })}
													<h3>{title}</h3>
													<p>{description}</p>
												</button>
											}
										})
										.collect_view()}
								</div>
							}
								.into_any()
						}
					})
			}}
		</section>
	}
}
