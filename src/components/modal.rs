//! Content modal.
//!
//! Renders whatever [`ModalView`] the navigation layer resolved. Escape, the
//! close button, or a click on the backdrop closes it. Escape first closes a
//! nested video player, then a gallery detail, then the modal itself.

use leptos::ev;
use leptos::prelude::*;
use log::debug;

use crate::content::ContentItem;
use crate::navigation::{
	BodyBlock, DetailView, GalleryView, ModalView, NarrativePart, StandardView, Toast, filter_gallery,
	youtube_embed,
};

const NO_RESULTS: &str = "검색 결과가 없습니다.";

#[component]
pub fn ContentModal(view: RwSignal<Option<ModalView>>) -> impl IntoView {
	let video = RwSignal::new(None::<String>);
	let detail = RwSignal::new(None::<DetailView>);
	let query = RwSignal::new(String::new());

	// Nested state belongs to one modal instance.
	Effect::new(move |_| {
		view.track();
		video.set(None);
		detail.set(None);
		query.set(String::new());
	});

	let handle = window_event_listener(ev::keydown, move |ev| {
		if ev.key() != "Escape" {
			return;
		}
		if video.with_untracked(Option::is_some) {
			video.set(None);
		} else if detail.with_untracked(Option::is_some) {
			detail.set(None);
		} else if view.with_untracked(Option::is_some) {
			debug!("modal: closed with escape");
			view.set(None);
		}
	});
	on_cleanup(move || handle.remove());

	let close = move |_| view.set(None);

	view! {
		<Show when=move || view.with(Option::is_some)>
			<div class="modal-overlay" on:click=close>
				<div class="modal" on:click=|ev| ev.stop_propagation()>
					<button class="modal-close" aria-label="닫기" on:click=close>"×"</button>
					{move || {
						view.get()
							.map(|v| match v {
								ModalView::Beliefs { title, parts } => beliefs(title, parts),
								ModalView::Gallery(g) => gallery(g, query, detail),
								ModalView::Standard(s) => standard(s, video),
							})
					}}
				</div>
				{move || {
					video.get()
						.map(|src| {
							view! {
								<div
									class="video-overlay"
									on:click=move |ev| {
										ev.stop_propagation();
										video.set(None);
									}
								>
									<iframe
										src=src
										allow="autoplay; encrypted-media; fullscreen"
										on:click=|ev| ev.stop_propagation()
									></iframe>
								</div>
							}
						})
				}}
			</div>
		</Show>
	}
}

fn heading(level: u8, text: String) -> AnyView {
	match level {
		0 | 1 => view! { <h3>{text}</h3> }.into_any(),
		2 => view! { <h4>{text}</h4> }.into_any(),
		_ => view! { <h5>{text}</h5> }.into_any(),
	}
}

fn beliefs(title: String, parts: Vec<NarrativePart>) -> AnyView {
	view! {
		<article class="beliefs-narrative">
			<h2>{title}</h2>
			{parts
				.into_iter()
				.map(|part| match part {
					NarrativePart::Heading { level, text } => heading(level, text),
					NarrativePart::Paragraph(text) => view! { <p>{text}</p> }.into_any(),
					NarrativePart::Image(src) => {
						view! { <img class="beliefs-image" src=src alt="" loading="lazy" /> }.into_any()
					}
				})
				.collect_view()}
		</article>
	}
	.into_any()
}

fn standard(s: StandardView, video: RwSignal<Option<String>>) -> AnyView {
	view! {
		<div class="modal-standard">
			<h2>{s.title}</h2>
			<div class="modal-images">
				{s.images
					.into_iter()
					.map(|src| view! { <img src=src alt="" loading="lazy" /> })
					.collect_view()}
			</div>
			<div class="modal-body">{s.body.into_iter().map(body_block).collect_view()}</div>
			<div class="toast-stack">{s.toasts.into_iter().map(|t| toast(t, video)).collect_view()}</div>
		</div>
	}
	.into_any()
}

fn body_block(block: BodyBlock) -> AnyView {
	match block {
		BodyBlock::Heading { level, text } => heading(level, text),
		BodyBlock::Paragraph(text) => view! { <p>{text}</p> }.into_any(),
		BodyBlock::Embed { url } => view! {
			<div class="modal-embed">
				<iframe src=url allow="fullscreen" loading="lazy"></iframe>
			</div>
		}
		.into_any(),
	}
}

fn toast(toast: Toast, video: RwSignal<Option<String>>) -> AnyView {
	match toast {
		Toast::Video { video_id, thumbnail, .. } => {
			let embed = youtube_embed(&video_id);
			view! {
				<button class="toast toast-video" on:click=move |_| video.set(Some(embed.clone()))>
					<img src=thumbnail alt="" />
					<span class="toast-play">"▶"</span>
				</button>
			}
			.into_any()
		}
		Toast::Link { url, title, domain, image } => view! {
			<a class="toast toast-link" href=url target="_blank" rel="noopener noreferrer">
				{image.map(|src| view! { <img src=src alt="" /> })}
				<span class="toast-title">{title}</span>
				<span class="toast-domain">{domain}</span>
			</a>
		}
		.into_any(),
	}
}

fn gallery(g: GalleryView, query: RwSignal<String>, detail: RwSignal<Option<DetailView>>) -> AnyView {
	let items = StoredValue::new(g.items);
	view! {
		<div class="modal-gallery">
			<h2>{g.title}</h2>
			{move || match detail.get() {
				Some(d) => detail_view(d, detail),
				None => {
					view! {
						<input
							type="search"
							class="gallery-search"
							placeholder="검색"
							prop:value=move || query.get()
							on:input=move |ev| query.set(event_target_value(&ev))
						/>
						{move || {
							let q = query.get();
							items
								.with_value(|items| {
									let hits = filter_gallery(items, &q);
									if hits.is_empty() {
										return view! { <p class="gallery-empty">{NO_RESULTS}</p> }.into_any();
									}
									view! {
										<div class="gallery-grid">
											{hits.into_iter().map(|item| gallery_card(item, detail)).collect_view()}
										</div>
									}
										.into_any()
								})
						}}
					}
						.into_any()
				}
			}}
		</div>
	}
	.into_any()
}

fn gallery_card(item: &ContentItem, detail: RwSignal<Option<DetailView>>) -> impl IntoView + use<> {
	let opened = DetailView::from_item(item);
	let thumb = item.first_image().map(str::to_string);
	let title = item.title.trim().to_string();
	view! {
		<button class="gallery-card" on:click=move |_| detail.set(Some(opened.clone()))>
			{thumb.map(|src| view! { <img src=src alt="" loading="lazy" /> })}
			<span class="gallery-card-title">{title}</span>
		</button>
	}
}

fn detail_view(d: DetailView, detail: RwSignal<Option<DetailView>>) -> AnyView {
	view! {
		<div class="gallery-detail">
			<button class="gallery-back" on:click=move |_| detail.set(None)>"← 목록으로"</button>
			<h3>{d.title}</h3>
			{d.images
				.into_iter()
				.map(|src| view! { <img src=src alt="" loading="lazy" /> })
				.collect_view()}
			{d.paragraphs.into_iter().map(|text| view! { <p>{text}</p> }).collect_view()}
		</div>
	}
	.into_any()
}
