use clap::Parser;
use sap_maint_search::{category, cli, error, export, rows, search, selector, store};
use cli::{Cli, Commands};
use error::{Result, SearchError};
use rows::TableRow;
use search::SearchSelection;
use store::DataStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = DataStore::open(&cli.source, &cli.data_dir);

    match cli.command {
        Commands::Search {
            equipment_no,
            order_no,
            name,
            top,
            middle,
            sub,
            with_links,
            detail,
            limit,
            json,
            export,
        } => {
            let selection = SearchSelection {
                equipment_no: equipment_no.unwrap_or_default(),
                order_no: order_no.unwrap_or_default(),
                equipment_name: name.unwrap_or_default(),
                top_category: top.unwrap_or_default(),
                middle_category: middle.unwrap_or_default(),
                sub_category: sub.unwrap_or_default(),
                with_links,
                detail_query: detail.unwrap_or_default(),
            };
            run_search(&store, &selection, limit, json, export)
        }
        Commands::Detail { order_no, json } => run_detail(&store, &order_no, json),
        Commands::Categories { top } => run_categories(&store, top.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_search(
    store: &DataStore,
    selection: &SearchSelection,
    limit: Option<usize>,
    json: bool,
    export_path: Option<PathBuf>,
) -> Result<()> {
    if !json {
        println!("🔎 sap-maint-search - 오더 검색\n");
        println!("[1/3] 데이터셋 로딩 중...");
    }
    let snapshot = store.snapshot()?;
    if !json {
        println!("✔ {}행 로딩 완료\n", snapshot.dataset.len());
        println!("[2/3] 검색 중...");
    }

    let filtered = search::apply_filters(
        snapshot.dataset.records(),
        selection,
        store.category_mappings(),
        store.terms(),
    );
    let total = search::count_distinct_orders(&filtered);
    let selected = selector::select_order_numbers(&filtered, limit, store.priority_marker());
    let table_rows = rows::build_table_rows(&filtered, &selected);

    if json {
        println!("{}", serde_json::to_string_pretty(&table_rows)?);
    } else {
        println!("✔ 전체 {}건 중 {}건 표시\n", total, table_rows.len());

        if let Some((equipment, equi_text)) =
            search::equipment_info(&filtered, &selection.equipment_no)
        {
            println!("설비: {} ({})\n", equipment, equi_text);
        }

        println!("[3/3] 결과");
        for row in &table_rows {
            let date = if row.work_date.is_empty() {
                "----------"
            } else {
                &row.work_date
            };
            let link_mark = if row.has_links { " 🔗" } else { "" };
            println!(
                "  {}  {}  {}{}",
                date, row.order_no, row.order_short_text, link_mark
            );
        }
    }

    if let Some(path) = export_path {
        if table_rows.is_empty() {
            return Err(SearchError::NoResults);
        }
        let output_path = resolve_export_path(&path, &selection.equipment_no);
        println!("\n- Excel 생성 중...");
        let sheet_rows = export::build_export_rows(&table_rows);
        export::excel::generate_excel(&sheet_rows, &output_path)?;
        println!("✔ Excel 출력: {}", output_path.display());
    }

    Ok(())
}

/// 디렉터리나 확장자 없는 경로를 받으면 기본 파일 이름을 붙인다.
fn resolve_export_path(output: &Path, equipment_no: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(export::default_export_name(equipment_no))
    } else {
        output.to_path_buf()
    }
}

fn run_detail(store: &DataStore, order_no: &str, json: bool) -> Result<()> {
    let snapshot = store.snapshot()?;
    let group: Vec<&sap_maint_search::Record> = snapshot
        .dataset
        .records()
        .iter()
        .filter(|r| r.order_no == order_no)
        .collect();
    if group.is_empty() {
        return Err(SearchError::OrderNotFound(order_no.to_string()));
    }

    let table_rows = rows::build_table_rows(&group, &[order_no.to_string()]);
    let row = table_rows
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::OrderNotFound(order_no.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&row.detail)?);
        return Ok(());
    }

    print_detail(&row, group[0]);
    Ok(())
}

fn print_detail(row: &TableRow, first: &sap_maint_search::Record) {
    println!("📋 오더 상세: {}\n", row.order_no);

    println!("[기본 정보]");
    for (label, value) in rows::order_info_fields(first) {
        if !value.is_empty() {
            println!("  {}: {}", label, value);
        }
    }

    if !row.confirm_text.is_empty() {
        println!("\n[정비 내용]");
        for line in row.confirm_text.lines() {
            println!("  {}", line);
        }
    }

    if !row.detail.long_text.is_empty() {
        println!("\n[정비실적 Long Text]");
        for line in row.detail.long_text.lines() {
            println!("  {}", line);
        }
    }

    if !row.detail.long_text_links.is_empty() {
        println!("\n[첨부 링크]");
        for link in &row.detail.long_text_links {
            println!("  {}", link);
        }
    }

    if !row.detail.materials.is_empty() {
        println!("\n[자재]");
        for material in &row.detail.materials {
            println!(
                "  {}  {}  {} {}",
                material.material, material.description, material.qty, material.uom
            );
        }
    }

    if !row.detail.work_details.is_empty() {
        println!("\n[작업 내역]");
        for detail in &row.detail.work_details {
            println!(
                "  {}  {}  {} {}",
                detail.start_of_execution, detail.worker_name, detail.actual_work, detail.work_unit
            );
        }
    }
}

fn run_categories(store: &DataStore, top_filter: Option<&str>) -> Result<()> {
    let snapshot = store.snapshot()?;
    let index = &snapshot.index;

    println!("📂 분류 옵션\n");
    for top in &index.top_options {
        if category::is_separator(top) {
            continue;
        }
        if let Some(filter) = top_filter {
            if top != filter {
                continue;
            }
        }
        println!("{}", top);
        for middle in index.middle_choices(top) {
            println!("  └ {}", middle);
            for sub in index.sub_choices(top, middle) {
                println!("      └ {}", sub);
            }
        }
    }
    Ok(())
}
