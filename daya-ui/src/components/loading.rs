use leptos::*;

#[component]
pub fn Loading(#[prop(default = "Memuat...")] label: &'static str) -> impl IntoView {
    view! {
        <div class="h-64 flex flex-col items-center justify-center text-gray-500">
            <div class="loading-spinner w-8 h-8 mb-2" />
            <span class="text-sm">{label}</span>
        </div>
    }
}
