//! sparstat CLI: load a YAML query description and print its binding-flow
//! analysis (projected MUST/MAYBE sets, per-group filter partition).

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use sparstat_analysis::StaticAnalysis;
use sparstat_ast::{
    parse_yaml_query, Constant, Func, Group, GroupMember, JoinGroup, QueryRoot, ValueExpr, VarSet,
};

#[derive(Parser)]
#[command(name = "sparstat")]
#[command(about = "Static binding-flow analysis for SPARQL graph-pattern trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a query description and print the report
    Analyze {
        /// Path to the query YAML file
        #[arg(short, long)]
        query: PathBuf,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Parse a query description and report whether it is well formed
    Validate {
        /// Path to the query YAML file
        #[arg(short, long)]
        query: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Analyze { query, json } => analyze(&query, json),
        Commands::Validate { query } => validate(&query),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    must_bound: Vec<String>,
    maybe_bound: Vec<String>,
    groups: Vec<GroupReport>,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    group: u64,
    optional: bool,
    incoming: Vec<String>,
    pre_filters: Vec<String>,
    join_filters: Vec<String>,
    post_filters: Vec<String>,
    prune_filters: Vec<String>,
}

fn analyze(path: &PathBuf, json: bool) -> CliResult<()> {
    let root = load(path)?;
    let sa = StaticAnalysis::new(&root);

    let report = Report {
        must_bound: var_names(&root, &sa.query_must_bound(&root.query)?),
        maybe_bound: var_names(&root, &sa.query_maybe_bound(&root.query)?),
        groups: collect_groups(&sa, &root)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

fn validate(path: &PathBuf) -> CliResult<()> {
    let root = load(path)?;
    // Touch the analysis so unresolved includes are reported too.
    let sa = StaticAnalysis::new(&root);
    sa.query_must_bound(&root.query)?;
    sa.query_maybe_bound(&root.query)?;
    println!("ok: {}", path.display());
    Ok(())
}

fn load(path: &PathBuf) -> CliResult<QueryRoot> {
    let text = fs::read_to_string(path)?;
    Ok(parse_yaml_query(&text)?)
}

fn collect_groups(
    sa: &StaticAnalysis<'_>,
    root: &QueryRoot,
) -> CliResult<Vec<GroupReport>> {
    let mut out = Vec::new();
    visit_group(sa, root, &root.query.where_clause, &mut out)?;
    for named in root.named.values() {
        visit_group(sa, root, &named.where_clause, &mut out)?;
    }
    Ok(out)
}

fn visit_group(
    sa: &StaticAnalysis<'_>,
    root: &QueryRoot,
    group: &Group,
    out: &mut Vec<GroupReport>,
) -> CliResult<()> {
    match group {
        Group::Join(jg) => visit_join_group(sa, root, jg, out),
        Group::Union(u) => {
            for branch in &u.branches {
                visit_join_group(sa, root, branch, out)?;
            }
            Ok(())
        }
    }
}

fn visit_join_group(
    sa: &StaticAnalysis<'_>,
    root: &QueryRoot,
    group: &JoinGroup,
    out: &mut Vec<GroupReport>,
) -> CliResult<()> {
    out.push(GroupReport {
        group: group.id.get(),
        optional: group.optional,
        incoming: var_names(root, &sa.incoming_bindings(group.id)?),
        pre_filters: filter_texts(root, &sa.pre_filters(group)?),
        join_filters: filter_texts(root, &sa.join_filters(group)?),
        post_filters: filter_texts(root, &sa.post_filters(group)?),
        prune_filters: filter_texts(root, &sa.prune_filters(group)?),
    });

    for member in &group.members {
        match member {
            GroupMember::Group(g) => visit_group(sa, root, g, out)?,
            GroupMember::Subquery(q) => visit_group(sa, root, &q.where_clause, out)?,
            GroupMember::Service(s) => visit_group(sa, root, &s.body, out)?,
            GroupMember::Statement(_)
            | GroupMember::Filter(_)
            | GroupMember::Bind(_)
            | GroupMember::NamedInclude(_) => {}
        }
    }
    Ok(())
}

fn print_text(report: &Report) {
    println!("projected MUST : {}", report.must_bound.join(" "));
    println!("projected MAYBE: {}", report.maybe_bound.join(" "));
    for g in &report.groups {
        println!(
            "group {}{}: incoming [{}]",
            g.group,
            if g.optional { " (optional)" } else { "" },
            g.incoming.join(" ")
        );
        print_filters("  pre  ", &g.pre_filters);
        print_filters("  join ", &g.join_filters);
        print_filters("  post ", &g.post_filters);
        print_filters("  prune", &g.prune_filters);
    }
}

fn print_filters(label: &str, filters: &[String]) {
    for f in filters {
        println!("{label}: FILTER {f}");
    }
}

fn var_names(root: &QueryRoot, vars: &VarSet) -> Vec<String> {
    vars.iter().map(|&v| root.var_name(v)).collect()
}

fn filter_texts(root: &QueryRoot, filters: &[&sparstat_ast::Filter]) -> Vec<String> {
    filters.iter().map(|f| format_expr(root, &f.expr)).collect()
}

fn format_expr(root: &QueryRoot, expr: &ValueExpr) -> String {
    match expr {
        ValueExpr::Var(v) => root.var_name(*v),
        ValueExpr::Const(Constant::Iri(iri)) => format!("<{iri}>"),
        ValueExpr::Const(Constant::Literal(lex)) => format!("{lex:?}"),
        ValueExpr::Call { func, args } => {
            let args: Vec<String> = args.iter().map(|a| format_expr(root, a)).collect();
            format!("{}({})", func_name(*func), args.join(", "))
        }
    }
}

fn func_name(func: Func) -> &'static str {
    match func {
        Func::Bound => "BOUND",
        Func::Not => "!",
        Func::And => "&&",
        Func::Or => "||",
        Func::Eq => "=",
        Func::Ne => "!=",
        Func::Lt => "<",
        Func::Le => "<=",
        Func::Gt => ">",
        Func::Ge => ">=",
        Func::Add => "+",
        Func::Sub => "-",
        Func::Mul => "*",
        Func::Div => "/",
        Func::Str => "STR",
        Func::Lang => "LANG",
        Func::Datatype => "DATATYPE",
        Func::SameTerm => "sameTerm",
        Func::IsIri => "isIRI",
        Func::IsLiteral => "isLiteral",
        Func::Regex => "REGEX",
    }
}

/// Printable error for the binary: IO, DSL and analysis errors all fold in.
type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
struct CliError(String);

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError(e.to_string())
    }
}

impl From<sparstat_ast::Error> for CliError {
    fn from(e: sparstat_ast::Error) -> Self {
        CliError(e.to_string())
    }
}
