//! Bills Page
//!
//! Owners generate this month's bills and verify uploaded proofs; tenants
//! submit a proof link for their unpaid bills.

use leptos::*;

use crate::api::{self, Bill};
use crate::components::Loading;
use crate::state::global::GlobalState;

#[component]
pub fn Bills() -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let bills = create_rw_signal(None::<Vec<Bill>>);
    let page = create_rw_signal(1usize);
    let total_pages = create_rw_signal(1usize);

    create_effect(move |_| {
        let current = page.get();
        let Some(token) = state.token() else {
            return;
        };
        spawn_local(async move {
            state.loading.set(true);
            match api::fetch_bills(&token, current).await {
                Ok(result) => {
                    total_pages.set(result.total_pages.max(1));
                    bills.set(Some(result.items));
                }
                Err(e) => state.show_error(&e),
            }
            state.loading.set(false);
        });
    });

    let replace_bill = move |updated: Bill| {
        bills.update(|list| {
            if let Some(list) = list {
                for bill in list.iter_mut().filter(|b| b.id == updated.id) {
                    *bill = updated.clone();
                }
            }
        });
    };

    let on_generate = move |_| {
        let Some(token) = state.token() else {
            return;
        };
        spawn_local(async move {
            match api::generate_bills(&token).await {
                Ok(result) => {
                    state.flash(&result.flash);
                    // reload the first page to show new bills
                    page.set(1);
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    let is_owner = move || state.session.get().map(|s| s.is_owner()).unwrap_or(false);

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">"Tagihan"</h1>
                <Show when=is_owner>
                    <button
                        class="px-4 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg"
                        on:click=on_generate
                    >
                        "Buat tagihan bulan ini"
                    </button>
                </Show>
            </div>

            {move || match bills.get() {
                None => view! { <Loading /> }.into_view(),
                Some(list) if list.is_empty() => view! {
                    <p class="text-gray-500">"Belum ada tagihan"</p>
                }.into_view(),
                Some(list) => list
                    .into_iter()
                    .map(|bill| view! { <BillRow bill=bill owner=is_owner() on_update=replace_bill /> })
                    .collect_view(),
            }}

            <div class="flex items-center space-x-4">
                <button
                    class="px-3 py-1 border rounded disabled:opacity-50"
                    prop:disabled=move || page.get() <= 1
                    on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
                >
                    "Sebelumnya"
                </button>
                <span class="text-sm">{move || format!("{} / {}", page.get(), total_pages.get())}</span>
                <button
                    class="px-3 py-1 border rounded disabled:opacity-50"
                    prop:disabled=move || page.get() >= total_pages.get()
                    on:click=move |_| page.update(|p| *p += 1)
                >
                    "Berikutnya"
                </button>
            </div>
        </div>
    }
}

#[component]
fn BillRow<F>(bill: Bill, owner: bool, on_update: F) -> impl IntoView
where
    F: Fn(Bill) + Copy + 'static,
{
    let state = expect_context::<GlobalState>();
    let proof = create_rw_signal(String::new());
    let bill_id = store_value(bill.id.clone());

    let verify = move |accept: bool| {
        let Some(token) = state.token() else {
            return;
        };
        spawn_local(async move {
            match api::verify_payment(&token, &bill_id.get_value(), accept).await {
                Ok(notice) => {
                    state.flash(&notice.flash);
                    on_update(notice.data);
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    let submit_proof = move |_| {
        let Some(token) = state.token() else {
            return;
        };
        let url = proof.get_untracked();
        spawn_local(async move {
            match api::upload_proof(&token, &bill_id.get_value(), &url).await {
                Ok(notice) => {
                    state.flash(&notice.flash);
                    proof.set(String::new());
                    on_update(notice.data);
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    let can_verify = owner && bill.status == "pending";
    let can_upload = !owner && bill.accepts_proof();

    view! {
        <div class="bg-white rounded-xl shadow p-4 flex flex-wrap items-center justify-between gap-4">
            <div>
                <p class="font-semibold">{format!("{} · Rp {:.0}", bill.month, bill.total)}</p>
                <p class="text-sm text-gray-500">
                    {format!("{:.3} kWh di atas batas · {}", bill.kwh_over_limit, bill.status_label())}
                </p>
                {bill.proof_url.clone().map(|url| view! {
                    <a href=url target="_blank" class="text-sm text-blue-600 underline">"Bukti bayar"</a>
                })}
                {bill.proof_uploaded_at.map(|at| view! {
                    <span class="text-xs text-gray-400 ml-2">
                        {format!("dikirim {}", at.format("%d/%m/%Y %H:%M"))}
                    </span>
                })}
            </div>

            {can_verify.then(|| view! {
                <div class="space-x-2">
                    <button class="px-3 py-1 bg-green-600 text-white rounded" on:click=move |_| verify(true)>
                        "Terima"
                    </button>
                    <button class="px-3 py-1 bg-red-600 text-white rounded" on:click=move |_| verify(false)>
                        "Tolak"
                    </button>
                </div>
            })}

            {can_upload.then(|| view! {
                <div class="flex space-x-2">
                    <input
                        type="url"
                        placeholder="Link bukti transfer"
                        class="border rounded px-3 py-1"
                        prop:value=proof
                        on:input=move |ev| proof.set(event_target_value(&ev))
                    />
                    <button class="px-3 py-1 bg-blue-600 text-white rounded" on:click=submit_proof>
                        "Kirim"
                    </button>
                </div>
            })}
        </div>
    }
}
