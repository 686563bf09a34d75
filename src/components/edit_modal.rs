use leptos::prelude::*;

/// Modal form for renaming a task.
#[component]
pub fn EditModal(
	#[prop(into)] open: Signal<bool>,
	#[prop(into)] label: Signal<String>,
	#[prop(into)] on_label_input: Callback<String>,
	#[prop(into)] on_save: Callback<()>,
	#[prop(into)] on_cancel: Callback<()>,
) -> impl IntoView {
	view! {
		<Show when=move || open.get()>
			<div class="modal-backdrop">
				<div class="modal">
					<h2 class="modal__title">"Edit Task"</h2>
					<label class="modal__label">"Label:"</label>
					<input
						type="text"
						class="modal__input"
						prop:value=move || label.get()
						on:input=move |ev| on_label_input.run(event_target_value(&ev))
					/>
					<div class="modal__actions">
						<button class="btn btn--primary" on:click=move |_| on_save.run(())>
							"Save"
						</button>
						<button class="btn btn--danger" on:click=move |_| on_cancel.run(())>
							"Cancel"
						</button>
					</div>
				</div>
			</div>
		</Show>
	}
}
