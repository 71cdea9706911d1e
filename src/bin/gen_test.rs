//! Synthetic Telegram HTML export generator for stress testing chatmood.
//!
//! Usage: cargo run --features gen-test --bin gen_test -- [messages] [output_dir] [per_page]
//! Example: cargo run --features gen-test --bin gen_test -- 50000 ChatExport 1000

use chrono::{Duration, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const SENDERS: &[&str] = &[
    "Alice",
    "Bob",
    "Иван",
    "Мария",
    "村上",
    "News <Bot>",
    "User \"Quoted\"",
    "🔥FireUser🔥",
];

const PHRASES: &[&str] = &[
    "Центробанк снова поднял ставку",
    "Отличные новости по выборам",
    "Новый смартфон вышел сегодня",
    "Ужасная ситуация на границе",
    "Просто обычный день",
    "Markets rallied after the announcement",
    "The election results are in",
    "This update broke everything, awful",
    "Great launch, congrats to the team!",
    "Commas, \"quotes\" and <tags> & ampersands",
];

const EMOJIS: &[&str] = &["😀", "😂", "😱", "🤯", "💀", "🔥", "👍", "❤️", "💔", "🇷🇺"];

fn main() {
    let args: Vec<String> = env::args().collect();

    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10_000);
    let output = args.get(2).map(|s| s.as_str()).unwrap_or("ChatExport");
    let per_page: usize = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1000);

    println!("🧪 Telegram Export Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Messages: {}", count);
    println!("   Output:   {}/", output);
    println!("   Per page: {}", per_page);
    println!();

    generate_export(count, Path::new(output), per_page);
}

fn generate_export(count: usize, dir: &Path, per_page: usize) {
    fs::create_dir_all(dir).expect("Failed to create output directory");

    let mut rng = rand::thread_rng();
    let start = std::time::Instant::now();
    let mut bytes_written: usize = 0;
    let pages = count.div_ceil(per_page).max(1);

    for page in 0..pages {
        let name = if page == 0 {
            "messages.html".to_string()
        } else {
            format!("messages{}.html", page + 1)
        };
        let file = File::create(dir.join(&name)).expect("Failed to create page file");
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);

        let header = page_header(page + 1);
        bytes_written += header.len();
        writer.write_all(header.as_bytes()).unwrap();

        let first = page * per_page;
        let last = (first + per_page).min(count);
        for i in first..last {
            let block = generate_block(&mut rng, i);
            bytes_written += block.len();
            writer.write_all(block.as_bytes()).unwrap();
        }

        writer.write_all(b"  </div>\n </body>\n</html>\n").unwrap();
        writer.flush().unwrap();
        eprint!("\r   Wrote {} ({}/{} pages)", name, page + 1, pages);
    }

    let elapsed = start.elapsed();
    let mb = bytes_written as f64 / 1_000_000.0;

    println!("\n\n✅ Done!");
    println!("   Size: {:.2} MB", mb);
    println!("   Time: {:.2}s", elapsed.as_secs_f64());
}

fn page_header(page: usize) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n <head>\n  <meta charset=\"utf-8\"/>\n  <title>Exported Data (page {page})</title>\n </head>\n <body>\n  <div class=\"history\">\n"
    )
}

/// One message block. Every 25th block is a variant the extractor must skip
/// or tolerate.
fn generate_block(rng: &mut impl Rng, index: usize) -> String {
    let title = date_title(index);
    let sender = escape_html(SENDERS.choose(rng).unwrap());

    match index % 25 {
        // Service message
        5 => format!(
            "   <div class=\"message service\" id=\"message-{index}\">\n    <div class=\"body details\">{sender} joined the group</div>\n   </div>\n"
        ),
        // Photo without caption
        10 => format!(
            "   <div class=\"message default clearfix\" id=\"message{index}\">\n    <div class=\"body\">\n     <div class=\"pull_right date details\" title=\"{title}\">10:00</div>\n     <div class=\"from_name\">{sender}</div>\n     <div class=\"media_wrap clearfix\"><a class=\"photo_wrap\" href=\"photos/photo_{index}.jpg\"></a></div>\n    </div>\n   </div>\n"
        ),
        // Continuation message: no sender
        15 => format!(
            "   <div class=\"message default clearfix joined\" id=\"message{index}\">\n    <div class=\"body\">\n     <div class=\"pull_right date details\" title=\"{title}\">10:01</div>\n     <div class=\"text\">{}</div>\n    </div>\n   </div>\n",
            generate_text(rng, index)
        ),
        // Broken date attribute
        20 => format!(
            "   <div class=\"message default clearfix\" id=\"message{index}\">\n    <div class=\"body\">\n     <div class=\"pull_right date details\" title=\"not a date\">??</div>\n     <div class=\"from_name\">{sender}</div>\n     <div class=\"text\">{}</div>\n    </div>\n   </div>\n",
            generate_text(rng, index)
        ),
        _ => format!(
            "   <div class=\"message default clearfix\" id=\"message{index}\">\n    <div class=\"body\">\n     <div class=\"pull_right date details\" title=\"{title}\">10:00</div>\n     <div class=\"from_name\">{sender}</div>\n     <div class=\"text\">{}</div>\n    </div>\n   </div>\n",
            generate_text(rng, index)
        ),
    }
}

/// Telegram style `title` attribute; 40 messages per day.
fn date_title(index: usize) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let day = base + Duration::days((index / 40) as i64);
    format!(
        "{} {:02}:{:02}:00 UTC+03:00",
        day.format("%d.%m.%Y"),
        (index / 60) % 24,
        index % 60
    )
}

fn generate_text(rng: &mut impl Rng, index: usize) -> String {
    let phrase = PHRASES.choose(rng).unwrap();
    let text = match index % 7 {
        0 => format!("{} {}", phrase, EMOJIS.choose(rng).unwrap()),
        1 => format!("{}<br>{}", escape_html(phrase), escape_html(PHRASES.choose(rng).unwrap())),
        2 => {
            let repeats = rng.gen_range(5..50);
            (0..repeats).map(|_| *phrase).collect::<Vec<_>>().join(". ")
        }
        _ => format!("{} #{}", phrase, index),
    };
    // index 1 already carries markup
    if index % 7 == 1 { text } else { escape_html(&text) }
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            c => result.push(c),
        }
    }
    result
}
