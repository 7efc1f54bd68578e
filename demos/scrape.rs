//! Extracting data from a page with selectors and traversal.
//!
//! Run with: `cargo run --example scrape`
#![allow(clippy::expect_used)]

use quarry::{Dom, LoadOptions};
use url::Url;

fn main() {
    let html = r#"
<!DOCTYPE html>
<html>
<head><title>Fruit stand</title></head>
<body>
  <ul id="fruits">
    <li class="apple" data-price="1.25" data-tags='["red","crisp"]'><a href="apple.html">Apple</a></li>
    <li class="orange" data-price="0.8"><a href="orange.html">Orange</a></li>
    <li class="pear sale" data-price="2"><a href="/pear">Pear</a></li>
  </ul>
  <p class="note">Prices in <abbr title="US dollars">USD</abbr>.</p>
</body>
</html>"#;

    let base = Url::parse("https://shop.example/fruit/").expect("valid base URL");
    let dom = Dom::load_with_options(html, LoadOptions::default().base_uri(base))
        .expect("failed to load page");

    println!("Title: {}", dom.select("title").expect("valid selector").text());

    let items = dom.select("#fruits > li").expect("valid selector");
    println!("{} fruits:", items.len());
    for item in &items {
        let item = dom.wrap(vec![item]);
        let link = item.find("a").expect("valid selector");
        let href = link
            .prop("href")
            .and_then(|p| p.as_str().map(str::to_string))
            .unwrap_or_default();
        println!(
            "  {:<8} price={:<5} sale={:<5} {}",
            link.text(),
            item.data("price").map(|v| v.to_string()).unwrap_or_default(),
            item.has_class("sale"),
            href
        );
    }

    let after_apple = dom.select(".apple").expect("valid selector").next_all();
    println!("After the apple: {}", after_apple.map(|_, s| s.text()).join(", "));

    let abbr = dom.select("abbr").expect("valid selector");
    println!(
        "Note mentions {} ({})",
        abbr.text(),
        abbr.attr("title").unwrap_or_default()
    );
    println!(
        "Closest list of the pear link: #{}",
        dom.select(".pear a")
            .and_then(|a| a.closest("ul"))
            .expect("valid selector")
            .attr("id")
            .unwrap_or_default()
    );
}
