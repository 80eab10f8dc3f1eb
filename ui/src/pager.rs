use dioxus::prelude::*;

/// How many page buttons to show around the current page.
const WINDOW: usize = 5;

#[component]
pub fn Pager(page: usize, page_count: usize, on_change: EventHandler<usize>) -> Element {
    if page_count <= 1 {
        return rsx! {};
    }

    rsx! {
        nav { class: "pager",
            button {
                class: "btn btn-secondary btn-sm",
                disabled: page <= 1,
                onclick: move |_| on_change.call(page - 1),
                "Previous"
            }
            for n in page_window(page, page_count, WINDOW) {
                button {
                    key: "{n}",
                    class: if n == page { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                    onclick: move |_| on_change.call(n),
                    "{n}"
                }
            }
            button {
                class: "btn btn-secondary btn-sm",
                disabled: page >= page_count,
                onclick: move |_| on_change.call(page + 1),
                "Next"
            }
            span { class: "pager-status text-muted", "Page {page} of {page_count}" }
        }
    }
}

/// Up to `width` consecutive page numbers, centred on `page` where possible.
pub fn page_window(page: usize, page_count: usize, width: usize) -> std::ops::RangeInclusive<usize> {
    let width = width.clamp(1, page_count.max(1));
    let page = page.clamp(1, page_count.max(1));

    let start = page.saturating_sub(width / 2).max(1);
    let start = start.min(page_count.max(1) + 1 - width);
    start..=start + width - 1
}
