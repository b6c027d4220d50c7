// src/render/html.rs

// --- Imports ---
use std::io::{self, Write};

use crate::render::bands::BandSet;
use crate::theses::order::{author_initial, SortPolicy};
use crate::theses::record::{Field, Record};

// --- Constants ---
pub const BEGIN_MARKER: &str = "<!-- *** BEGIN THESIS/DISSERTATION CONTENT HERE *** --!>";
pub const END_MARKER: &str = "<!-- *** END THESIS/DISSERTATION CONTENT HERE *** --!>";

const DEGREE_MS: &[u8] = b"MS";
const DEGREE_PHD: &[u8] = b"PhD";

/// Aggregate counts emitted at the bottom of the fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub total: usize,
    pub ms: usize,
    pub phd: usize,
}

impl RenderSummary {
    fn tally(&mut self, record: &Record) {
        self.total += 1;
        match record.degree.as_bytes() {
            DEGREE_MS => self.ms += 1,
            DEGREE_PHD => self.phd += 1,
            _ => {}
        }
    }
}

/// Writes a field's bytes as they were read; no escaping, no re-encoding.
fn write_field<W: Write + ?Sized>(out: &mut W, field: &Field) -> io::Result<()> {
    out.write_all(field.as_bytes())
}

// --- Grouping Strategies ---
/// Decides the navigation header and the anchors placed between records.
pub trait SectionGrouping {
    /// Writes the "Jump to" header for the already ordered records.
    fn write_navigation(&self, records: &[Record], out: &mut dyn Write) -> io::Result<()>;

    /// Called before each record's table; may emit an anchor or heading.
    fn before_record(&mut self, record: &Record, out: &mut dyn Write) -> io::Result<()>;
}

/// Alphabetic bands for author-ordered pages.
pub struct BandGrouping<'a> {
    bands: &'a BandSet,
    next_band: usize,
}

impl<'a> BandGrouping<'a> {
    pub fn new(bands: &'a BandSet) -> Self {
        Self { bands, next_band: 0 }
    }
}

impl SectionGrouping for BandGrouping<'_> {
    fn write_navigation(&self, _records: &[Record], out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "  <b>Jump to:</b>&nbsp;")?;
        let bands = self.bands.bands();
        for (i, band) in bands.iter().enumerate() {
            let sep = if i + 1 < bands.len() { "&nbsp;|" } else { "" };
            writeln!(out, "  <a href=\"#{0}\">{0}</a>{1}", band.label(), sep)?;
        }
        writeln!(out)
    }

    fn before_record(&mut self, record: &Record, out: &mut dyn Write) -> io::Result<()> {
        // At most one band per record; later bands wait for later records
        let Some(band) = self.bands.bands().get(self.next_band) else {
            return Ok(());
        };
        match author_initial(&record.author) {
            Some(initial) if initial >= band.start() => {
                tracing::debug!("Inserting band anchor {} at '{}'", band.label(), record.author);
                writeln!(out, "  <a name={}></a>\n", band.label())?;
                self.next_band += 1;
            }
            _ => {}
        }
        Ok(())
    }
}

/// One heading per run of equal years for year-ordered pages.
#[derive(Default)]
pub struct YearGrouping {
    current: Option<Field>,
}

impl YearGrouping {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SectionGrouping for YearGrouping {
    /// Links every run of equal consecutive years. With no records the
    /// "Jump to" box is still written, just without links, so the page
    /// keeps its layout; no year heading follows it.
    fn write_navigation(&self, records: &[Record], out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "  <div style=\"width:800px;\">")?;
        writeln!(out, "    <b>Jump to:</b>&nbsp;")?;
        let mut previous: Option<&Field> = None;
        for record in records {
            let year = &record.year;
            if previous == Some(year) {
                continue;
            }
            if previous.is_some() {
                writeln!(out, "|")?;
            }
            write!(out, "    <a href=\"#")?;
            write_field(out, year)?;
            write!(out, "\">")?;
            write_field(out, year)?;
            write!(out, "</a>&nbsp;")?;
            previous = Some(year);
        }
        if previous.is_some() {
            writeln!(out)?;
        }
        writeln!(out, "  </div>")
    }

    fn before_record(&mut self, record: &Record, out: &mut dyn Write) -> io::Result<()> {
        if self.current.as_ref() == Some(&record.year) {
            return Ok(());
        }
        write!(out, "  <a name=")?;
        write_field(out, &record.year)?;
        writeln!(out, "></a>")?;
        write!(out, "  <center><b>")?;
        write_field(out, &record.year)?;
        writeln!(out, "</b></center><br>\n")?;
        self.current = Some(record.year.clone());
        Ok(())
    }
}

// --- Main Renderer ---
/// Renders ordered records into the embeddable HTML fragment.
///
/// Field values are written verbatim; no HTML escaping is applied.
pub struct HtmlRenderer<'a> {
    policy: SortPolicy,
    bands: &'a BandSet,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(policy: SortPolicy, bands: &'a BandSet) -> Self {
        Self { policy, bands }
    }

    fn grouping(&self) -> Box<dyn SectionGrouping + 'a> {
        match self.policy {
            SortPolicy::Author => Box::new(BandGrouping::new(self.bands)),
            SortPolicy::Year => Box::new(YearGrouping::new()),
        }
    }

    /// Writes the fragment for `records`, which must already be ordered by
    /// this renderer's policy.
    pub fn render<W: Write>(&self, records: &[Record], out: &mut W) -> io::Result<RenderSummary> {
        let mut grouping = self.grouping();
        let mut summary = RenderSummary::default();

        writeln!(out, "{}", BEGIN_MARKER)?;
        writeln!(out, "<div align=\"center\">\n")?;

        grouping.write_navigation(records, out)?;
        writeln!(out, "  <br><br>\n")?;

        for record in records {
            summary.tally(record);
            grouping.before_record(record, out)?;
            write_record_table(record, out)?;
        }

        writeln!(out, "  <center>Number of items: <b>{}</b></center>", summary.total)?;
        writeln!(out, "  <center>({} MS | {} PhD)</center>\n", summary.ms, summary.phd)?;

        writeln!(out, "</div>")?;
        writeln!(out, "{}", END_MARKER)?;

        tracing::info!(
            "Rendered {} records ({} MS, {} PhD)",
            summary.total, summary.ms, summary.phd
        );
        Ok(summary)
    }
}

fn write_record_table<W: Write + ?Sized>(record: &Record, out: &mut W) -> io::Result<()> {
    writeln!(out, "  <table style=\"border:1px solid black; width:600px;\">")?;
    let rows = [
        ("Author", &record.author),
        ("Year", &record.year),
        ("Title", &record.title),
        ("Advisor", &record.advisor),
        ("Affiliation", &record.affiliation),
    ];
    for (label, value) in rows {
        write!(out, "    <tr><td><b>{}:</b> ", label)?;
        write_field(out, value)?;
        writeln!(out, "</td></tr>")?;
    }
    write!(out, "    <tr><td><b>Degree:</b> ")?;
    write_field(out, &record.degree)?;
    write!(out, "</td>")?;
    if record.url.is_empty() {
        writeln!(out, "</tr>")?;
    } else {
        write!(out, "<td align=\"right\"><a href=\"")?;
        write_field(out, &record.url)?;
        writeln!(out, "\" target=\"_blank\">URL</a></td></tr>")?;
    }
    writeln!(out, "  </table><br>\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn rec(author: &str, year: &str, degree: &str, url: &str) -> Record {
        Record {
            author: author.into(),
            year: year.into(),
            title: format!("Title of {}", author).into(),
            advisor: "Advisor, A.".into(),
            affiliation: "Some University".into(),
            degree: degree.into(),
            url: url.into(),
        }
    }

    fn render_bytes(policy: SortPolicy, records: &[Record]) -> (Vec<u8>, RenderSummary) {
        let bands = BandSet::default();
        let mut out = Vec::new();
        let summary = HtmlRenderer::new(policy, &bands).render(records, &mut out).expect("render");
        (out, summary)
    }

    fn render(policy: SortPolicy, mut records: Vec<Record>) -> (String, RenderSummary) {
        policy.sort(&mut records);
        let (out, summary) = render_bytes(policy, &records);
        (String::from_utf8(out).expect("utf8"), summary)
    }

    fn two_records() -> Vec<Record> {
        vec![rec("Smith, J.", "2019", "PhD", ""), rec("Adams, K.", "2020", "MS", "http://x")]
    }

    #[test]
    fn author_order_example_output() {
        let (html, summary) = render(SortPolicy::Author, two_records());
        assert_eq!(summary, RenderSummary { total: 2, ms: 1, phd: 1 });
        assert!(html.starts_with(BEGIN_MARKER));
        assert!(html.trim_end().ends_with(END_MARKER));
        assert!(html.find("Adams, K.").unwrap() < html.find("Smith, J.").unwrap());
        assert!(html.contains("    <tr><td><b>Degree:</b> MS</td><td align=\"right\"><a href=\"http://x\" target=\"_blank\">URL</a></td></tr>\n"));
        assert!(html.contains("    <tr><td><b>Degree:</b> PhD</td></tr>\n"));
        assert!(html.contains("  <center>Number of items: <b>2</b></center>\n"));
        assert!(html.contains("  <center>(1 MS | 1 PhD)</center>\n"));
    }

    #[test]
    fn author_order_emits_only_reached_bands() {
        let (html, _) = render(SortPolicy::Author, two_records());
        assert!(html.contains("  <a href=\"#A-G\">A-G</a>&nbsp;|\n"));
        assert!(html.contains("  <a href=\"#V-Z\">V-Z</a>\n\n"));
        assert!(html.contains("  <a name=A-G></a>\n"));
        assert!(html.contains("  <a name=H-N></a>\n"));
        assert!(!html.contains("<a name=O-U>"));
        assert!(!html.contains("<a name=V-Z>"));
        // The second band lands right before Smith's table
        let anchor = html.find("<a name=H-N>").unwrap();
        assert!(anchor > html.find("Adams, K.").unwrap());
        assert!(anchor < html.find("Smith, J.").unwrap());
    }

    #[test]
    fn lowercase_author_triggers_band_by_folded_initial() {
        let (html, _) = render(SortPolicy::Author, vec![rec("zhang, w.", "2001", "MS", "")]);
        assert!(html.contains("<a name=A-G>"));
        assert!(html.contains("<b>Author:</b> zhang, w.</td>"));
    }

    #[test]
    fn year_order_groups_by_distinct_year() {
        let records = vec![
            rec("Smith, J.", "2019", "PhD", ""),
            rec("Adams, K.", "2020", "MS", "http://x"),
            rec("Baker, L.", "2019", "BS", ""),
        ];
        let (html, summary) = render(SortPolicy::Year, records);
        assert_eq!(summary, RenderSummary { total: 3, ms: 1, phd: 1 });
        assert!(html.contains(
            "    <a href=\"#2020\">2020</a>&nbsp;|\n    <a href=\"#2019\">2019</a>&nbsp;\n  </div>\n"
        ));
        assert_eq!(html.matches("<a name=2019></a>").count(), 1);
        assert_eq!(html.matches("<center><b>2020</b></center><br>").count(), 1);
        let heading_2019 = html.find("<a name=2019>").unwrap();
        assert!(heading_2019 > html.find("Adams, K.").unwrap());
        assert!(heading_2019 < html.find("Baker, L.").unwrap());
        assert!(html.find("Baker, L.").unwrap() < html.find("Smith, J.").unwrap());
    }

    #[test]
    fn year_navigation_merges_only_adjacent_years() {
        // Rendered as given, without sorting first
        let records = vec![
            rec("Adams, K.", "2020", "MS", ""),
            rec("Baker, L.", "2019", "PhD", ""),
            rec("Cole, M.", "2020", "MS", ""),
        ];
        let (out, summary) = render_bytes(SortPolicy::Year, &records);
        let html = String::from_utf8(out).expect("utf8");
        assert_eq!(summary.total, 3);
        assert_eq!(html.matches("href=\"#2020\"").count(), 2);
        assert_eq!(html.matches("href=\"#2019\"").count(), 1);
        assert_eq!(html.matches("<a name=2020></a>").count(), 2);
        assert_eq!(html.matches("<a name=2019></a>").count(), 1);
        let second_2020 = html.rfind("<a name=2020>").unwrap();
        assert!(second_2020 > html.find("Baker, L.").unwrap());
        assert!(second_2020 < html.find("Cole, M.").unwrap());
    }

    #[test]
    fn non_utf8_fields_are_written_byte_for_byte() {
        fn latin1(bytes: &[u8]) -> Field {
            Field::from(bytes)
        }
        fn contains(haystack: &[u8], needle: &[u8]) -> bool {
            haystack.windows(needle.len()).any(|w| w == needle)
        }
        let mut records = vec![
            Record { author: latin1(b"M\xfcller, A."), year: "2010".into(), degree: "PhD".into(), ..Default::default() },
            Record {
                author: latin1(b"M\xe4der, B."),
                year: "2011".into(),
                title: latin1(b"Stra\xdfe"),
                degree: "MS".into(),
                url: latin1(b"http://x/\xe9"),
                ..Default::default()
            },
        ];
        SortPolicy::Author.sort(&mut records);
        let (out, summary) = render_bytes(SortPolicy::Author, &records);
        assert_eq!(summary, RenderSummary { total: 2, ms: 1, phd: 1 });

        assert!(contains(&out, b"<b>Author:</b> M\xfcller, A.</td>"));
        assert!(contains(&out, b"<b>Author:</b> M\xe4der, B.</td>"));
        assert!(contains(&out, b"<b>Title:</b> Stra\xdfe</td>"));
        assert!(contains(&out, b"<a href=\"http://x/\xe9\" target=\"_blank\">"));
        assert!(!contains(&out, "\u{FFFD}".as_bytes()));
        // 0xE4 sorts before 0xFC
        let mader = out.windows(3).position(|w| w == b"M\xe4d").unwrap();
        let muller = out.windows(3).position(|w| w == b"M\xfcl").unwrap();
        assert!(mader < muller);
    }

    #[test]
    fn empty_input_renders_markers_and_zero_counts() {
        for policy in [SortPolicy::Author, SortPolicy::Year] {
            let (html, summary) = render(policy, Vec::new());
            assert_eq!(summary, RenderSummary::default());
            assert!(html.contains(BEGIN_MARKER) && html.contains(END_MARKER));
            assert!(html.contains("Number of items: <b>0</b>"));
            assert!(html.contains("(0 MS | 0 PhD)"));
            assert!(!html.contains("<a name="));
            assert!(!html.contains("<table"));
        }
        let (html, _) = render(SortPolicy::Year, Vec::new());
        assert!(html.contains("    <b>Jump to:</b>&nbsp;\n  </div>\n"));
    }

    #[test]
    fn degree_tallies_are_exact_matches() {
        let records = vec![
            rec("A", "1", "MS", ""),
            rec("B", "1", "PhD", ""),
            rec("C", "1", "ms", ""),
            rec("D", "1", "PhD ", ""),
            rec("E", "1", "", ""),
        ];
        let (_, summary) = render(SortPolicy::Author, records);
        assert_eq!(summary, RenderSummary { total: 5, ms: 1, phd: 1 });
        assert!(summary.ms + summary.phd <= summary.total);
    }

    #[test]
    fn labelled_fields_round_trip_verbatim() {
        let original = vec![
            Record {
                author: "O'Neil, <i>P</i>".into(),
                year: "1998".into(),
                title: "Ions & Electrons".into(),
                advisor: Field::default(),
                affiliation: "Dept. of Physics".into(),
                degree: "PhD".into(),
                url: "http://example.org/t.pdf".into(),
            },
            rec("Adams, K.", "2020", "MS", ""),
        ];
        let (html, _) = render(SortPolicy::Author, original.clone());

        // Rendering performs no escaping, so markup inside fields is reparsed;
        // compare on inner HTML to recover the raw strings.
        let document = Html::parse_fragment(&html);
        let table = Selector::parse("table").unwrap();
        let cell = Selector::parse("tr > td:first-child").unwrap();
        let link = Selector::parse("a[target=\"_blank\"]").unwrap();

        let mut rendered = Vec::new();
        for block in document.select(&table) {
            let values: Vec<String> = block
                .select(&cell)
                .map(|td| {
                    let inner = td.inner_html();
                    let (_, value) = inner.split_once("</b> ").unwrap_or(("", ""));
                    value.to_string()
                })
                .collect();
            assert_eq!(values.len(), 6);
            let url = block.select(&link).next().and_then(|a| a.value().attr("href")).unwrap_or("").to_string();
            rendered.push((values, url));
        }

        let mut expected = original;
        SortPolicy::Author.sort(&mut expected);
        assert_eq!(rendered.len(), expected.len());
        for ((values, url), record) in rendered.iter().zip(&expected) {
            let html_text = |s: &str| s.replace('&', "&amp;");
            assert_eq!(values[0], html_text(&record.author.to_string()));
            assert_eq!(record.year, values[1].as_str());
            assert_eq!(values[2], html_text(&record.title.to_string()));
            assert_eq!(record.advisor, values[3].as_str());
            assert_eq!(record.affiliation, values[4].as_str());
            assert_eq!(record.degree, values[5].as_str());
            assert_eq!(record.url, url.as_str());
        }
        // And the raw output carries the strings byte for byte
        assert!(html.contains("<b>Author:</b> O'Neil, <i>P</i></td>"));
        assert!(html.contains("<b>Title:</b> Ions & Electrons</td>"));
    }
}
