use colored::*;
use pantry_core::{
    CartSelection, ChatRole, ChatTurn, CheckoutSummary, ContentSegment, IngredientDirective, IngredientItem,
    RecipeSummary,
};
use pulldown_cmark::{Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};

/// Formats a price in taka, dropping the fraction for whole amounts
pub fn format_price(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("৳{:.0}", amount)
    } else {
        format!("৳{:.2}", amount)
    }
}

/// Print an assistant reply: prose as markdown, bundles as numbered purchase affordances
pub fn print_reply(segments: &[ContentSegment]) {
    println!("{}:", "Assistant".blue().bold());
    print!("{}", render_segments(segments));
}

pub fn render_segments(segments: &[ContentSegment]) -> String {
    let mut output = String::new();
    let mut bundle_number = 0;

    for segment in segments {
        match segment {
            ContentSegment::Prose(text) => output.push_str(&render_markdown(text)),
            ContentSegment::Directive(directive) => {
                bundle_number += 1;
                output.push_str(&render_bundle(bundle_number, directive));
            }
        }
    }

    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

/// One "buy missing ingredients" card
pub fn render_bundle(number: usize, directive: &IngredientDirective) -> String {
    format!(
        "\n{} {}\n   {}\n   {} {}\n",
        format!("[{}]", number).yellow().bold(),
        "Missing Ingredients Bundle".yellow().bold(),
        directive.item_names().dimmed(),
        format!("Buy All {}", format_price(directive.total())).black().on_yellow(),
        format!("(/buy {})", number).dimmed(),
    )
}

/// Missing items shown on a recipe card before the "+n more" line
const MISSING_PREVIEW: usize = 3;

/// Print the recipe cards of a reply. Every card lists the reply's missing
/// ingredients; with no recipes the missing list is shown on its own.
pub fn print_recipes(recipes: &[RecipeSummary], missing: &[IngredientItem]) {
    if recipes.is_empty() {
        if !missing.is_empty() {
            print!("{}", render_missing_ingredients(missing));
        }
        return;
    }
    for recipe in recipes {
        print!("{}", render_recipe_card(recipe, missing));
    }
}

pub fn render_recipe_card(recipe: &RecipeSummary, missing: &[IngredientItem]) -> String {
    let mut card = format!("\n{} {}", "Recipe:".cyan(), recipe.title.bold());
    if let Some(rating) = recipe.rating {
        card.push_str(&format!(" {}", format!("★ {:.1}", rating).yellow()));
    }
    card.push('\n');

    if !recipe.description.is_empty() {
        card.push_str(&format!("   {}\n", recipe.description.dimmed()));
    }

    let mut facts = Vec::new();
    if recipe.prep_time.is_some() || recipe.cook_time.is_some() {
        let minutes = recipe.prep_time.unwrap_or(0) + recipe.cook_time.unwrap_or(0);
        facts.push(format!("{} min", minutes));
    }
    if let Some(servings) = recipe.servings {
        facts.push(format!("{} servings", servings));
    }
    if let Some(difficulty) = &recipe.difficulty {
        facts.push(difficulty.clone());
    }
    if !facts.is_empty() {
        card.push_str(&format!("   {}\n", facts.join(" · ")));
    }

    if missing.is_empty() {
        card.push_str(&format!("   {}\n", "✓ You have all ingredients!".green()));
    } else {
        card.push_str(&render_missing_ingredients(missing));
    }
    card
}

/// Missing-ingredient list with its total and the command that buys it
pub fn render_missing_ingredients(missing: &[IngredientItem]) -> String {
    let total: f64 = missing.iter().map(IngredientItem::line_total).sum();
    let mut section = format!(
        "   {} {}\n",
        "Missing Ingredients:".bold(),
        format_price(total).truecolor(234, 88, 12).bold()
    );
    for item in missing.iter().take(MISSING_PREVIEW) {
        section.push_str(&format!("     • {} - {}\n", item.name, format_price(item.line_total())));
    }
    if missing.len() > MISSING_PREVIEW {
        section.push_str(&format!(
            "     {}\n",
            format!("+{} more items", missing.len() - MISSING_PREVIEW).italic().dimmed()
        ));
    }
    section.push_str(&format!(
        "   {} {}\n",
        "Buy Missing Items".black().on_yellow(),
        "(/missing)".dimmed()
    ));
    section
}

pub fn print_cart(cart: &CartSelection) {
    if cart.is_empty() {
        println!("{}", "Your selection is empty. Use /buy <n> to pick a bundle.".yellow());
        return;
    }

    println!("{} ({} items)", "Add to Cart".green().bold(), cart.len());
    for (i, item) in cart.items().iter().enumerate() {
        let stock = match item.in_stock {
            Some(false) => " (out of stock)".red().to_string(),
            _ => String::new(),
        };
        println!("  {}. {} - {}{}", i + 1, item.name, format_price(item.price), stock);
    }
    println!("{}", "─".repeat(32).dimmed());
    println!("  {} {}", "Total:".bold(), format_price(cart.total()).green().bold());
    println!("{}", "/remove <i>, /checkout or /cancel".dimmed());
}

pub fn print_checkout(summary: &CheckoutSummary) {
    println!("{}", "Items added to cart! 🎉".green().bold());
    for item in &summary.items {
        println!("  • {} - {}", item.name, format_price(item.price));
    }
    println!("  {} {}", "Total:".bold(), format_price(summary.total).green().bold());
}

pub fn print_preferences(selected: &[String], options: &[String]) {
    let rendered: Vec<String> = options
        .iter()
        .map(|option| {
            if selected.contains(option) {
                format!("✓ {}", option).white().on_truecolor(249, 115, 22).to_string()
            } else {
                option.dimmed().to_string()
            }
        })
        .collect();
    println!("{} {}", "Dietary preferences:".cyan(), rendered.join("  "));
}

pub fn print_turn(turn: &ChatTurn, segments: &[ContentSegment]) {
    let time = turn.created_at.format("%H:%M");
    match turn.role {
        ChatRole::User => println!("{} {}: {}", time.to_string().dimmed(), "You".green().bold(), turn.content),
        ChatRole::Assistant => {
            println!("{} {}:", time.to_string().dimmed(), "Assistant".blue().bold());
            print!("{}", render_segments(segments));
        }
    }
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "pantry \"what can I cook with lentils?\"".green().bold());
    println!("    Ask the grocery assistant a single question");
    println!();
    println!("  {}", "pantry -i".green().bold());
    println!("    Start an interactive chat session");
    println!();
    println!("{}", "Options:".cyan());
    println!("  -p, --pref <TAG>      Add a dietary preference (repeatable)");
    println!("  --endpoint <URL>      Assistant service base URL");
    println!("  --session <PATH>      Resume and save the session in a file");
    println!("  --help                Show this help message");
    println!();
}

pub fn print_help() {
    println!("{}", "Commands:".cyan().bold());
    for (command, description) in [
        ("/prefs", "show dietary preferences"),
        ("/pref <tag>", "toggle a dietary preference"),
        ("/prefs clear", "clear all preferences"),
        ("/buy <n>", "open bundle n of the last reply in the cart"),
        ("/add <n>", "add bundle n to the current selection"),
        ("/missing", "open the last reply's missing ingredients in the cart"),
        ("/cart", "show the current selection"),
        ("/remove <i>", "remove item i from the selection"),
        ("/checkout", "add the selection to the cart"),
        ("/cancel", "discard the selection"),
        ("/history", "replay the conversation"),
        ("exit", "end the session"),
    ] {
        println!("  {:<14} {}", command.green(), description);
    }
}

/// Render markdown in the terminal
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = MdParser::new_ext(markdown, options);

    let mut output = String::new();
    let mut strong = 0usize;
    let mut emphasis = 0usize;
    let mut in_code_block = false;
    // One entry per open list: next number for ordered lists
    let mut lists: Vec<Option<u64>> = Vec::new();

    for event in parser {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                let marker = match level {
                    HeadingLevel::H1 => "#",
                    HeadingLevel::H2 => "##",
                    _ => "›",
                };
                output.push_str(&format!("{} ", marker.bright_cyan().bold()));
                strong += 1;
            }
            MdEvent::End(Tag::Heading(..)) => {
                strong = strong.saturating_sub(1);
                output.push('\n');
            }
            MdEvent::Start(Tag::Paragraph) => {
                if lists.is_empty() && !output.is_empty() && !output.ends_with("\n\n") {
                    output.push('\n');
                }
            }
            MdEvent::End(Tag::Paragraph) => {
                if lists.is_empty() {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::List(start)) => {
                if lists.is_empty() && !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                lists.push(start);
            }
            MdEvent::End(Tag::List(_)) => {
                lists.pop();
            }
            MdEvent::Start(Tag::Item) => {
                let indent = "  ".repeat(lists.len().saturating_sub(1));
                let bullet = match lists.last_mut() {
                    Some(Some(n)) => {
                        let label = format!("{}.", n);
                        *n += 1;
                        label.yellow().to_string()
                    }
                    _ => "•".yellow().to_string(),
                };
                output.push_str(&format!("{}{} ", indent, bullet));
            }
            MdEvent::End(Tag::Item) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::Strong) => strong += 1,
            MdEvent::End(Tag::Strong) => strong = strong.saturating_sub(1),
            MdEvent::Start(Tag::Emphasis) => emphasis += 1,
            MdEvent::End(Tag::Emphasis) => emphasis = emphasis.saturating_sub(1),
            MdEvent::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                output.push('\n');
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                in_code_block = false;
                output.push('\n');
            }
            MdEvent::End(Tag::TableCell) => output.push_str(" │ "),
            MdEvent::End(Tag::TableRow) | MdEvent::End(Tag::TableHead) => output.push('\n'),
            MdEvent::End(Tag::Table(_)) => output.push('\n'),
            MdEvent::Text(text) => {
                let styled = if in_code_block {
                    text.dimmed()
                } else if strong > 0 {
                    text.bold()
                } else if emphasis > 0 {
                    text.italic()
                } else {
                    text.normal()
                };
                output.push_str(&styled.to_string());
            }
            MdEvent::Code(code) => {
                output.push_str(&format!("`{}`", code.on_bright_black().white()));
            }
            MdEvent::TaskListMarker(done) => {
                output.push_str(if done { "[x] " } else { "[ ] " });
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            MdEvent::Rule => {
                output.push_str(&"─".repeat(40).dimmed().to_string());
                output.push('\n');
            }
            MdEvent::Html(html) => output.push_str(&html),
            _ => {}
        }
    }

    output
}
