//! HTML fixtures shared by the collector tests.

use std::fmt::Write as _;
use std::time::Duration;

use crate::context::FetchSettings;

pub(crate) const BASE_URL: &str = "https://jobs.test/public/jobs/search?order=new";

pub(crate) fn settings() -> FetchSettings {
    FetchSettings {
        base_url: BASE_URL.to_string(),
        wait_timeout: Duration::from_millis(10),
        ..FetchSettings::default()
    }
    .without_delays()
}

/// Absolute link of the `index`-th card on listing page `page`.
pub(crate) fn job_link(page: u32, index: usize) -> String {
    format!("https://jobs.test/public/jobs/{page}{index:02}")
}

/// A listing page with `count` cards.
pub(crate) fn listing_html(page: u32, count: usize, has_next: bool) -> String {
    let mut html = String::from("<html><body><div class=\"results\">");
    for index in 0..count {
        let _ = write!(
            html,
            r#"<div class="UNzN7">
                 <div class="FY2t2"><div class="WkZ08"><h3>
                   <a href="/public/jobs/{page}{index:02}">Job {page}-{index}</a>
                 </h3></div></div>
                 <div class="irB0G">Summary {page}-{index}</div>
                 <span class="lCkhZ">5,000円</span>
                 <b class="D0ZNl">{index}</b>
               </div>"#
        );
    }
    html.push_str("</div>");
    if has_next {
        html.push_str(r#"<a rel="next" href="?page=next">next</a>"#);
    }
    html.push_str("</body></html>");
    html
}

/// A detail page carrying the ready marker and a description.
pub(crate) fn detail_html(description: &str) -> String {
    format!(
        r#"<html><body>
             <section class="job_offer_detail_header"><h1>Detail</h1></section>
             <section class="detail_information"><table><tr>
               <td class="confirm_outside_link">{description}</td>
             </tr></table></section>
             <section class="application_status"><table>
               <tr><th>応募</th><td>7 人</td></tr>
               <tr><th>契約</th><td>0 人</td></tr>
               <tr><th>募集</th><td>2 人</td></tr>
             </table></section>
           </body></html>"#
    )
}
