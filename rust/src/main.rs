use std::env;
use std::process;

use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pmc::{
    Identity, IssueRequest, Role, Tier, ValidationResult, checksum, derive_fingerprint,
    derive_signature, issue, lookup, normalize, parse_url_safe, signature_digest_hex, validate,
};

#[derive(Debug, Clone)]
struct IssueOpts {
    tier: Tier,
    role: Role,
    first: String,
    last: String,
    dob: Option<String>,
    phone: Option<String>,
    nm2: Option<String>,
    sig: Option<String>,
    holder_nm2: Option<String>,
    holder_sig: Option<String>,
    json: bool,
}

impl IssueOpts {
    fn from_env() -> Result<Self, String> {
        Ok(Self {
            tier: default_tier()?,
            role: default_role()?,
            first: String::new(),
            last: String::new(),
            dob: None,
            phone: None,
            nm2: None,
            sig: None,
            holder_nm2: None,
            holder_sig: None,
            json: false,
        })
    }
}

fn default_tier() -> Result<Tier, String> {
    let raw = env::var("PMC_TIER").unwrap_or_else(|_| "F50".to_string());
    raw.parse().map_err(|e: pmc::PmcError| format!("PMC_TIER: {e}"))
}

fn default_role() -> Result<Role, String> {
    let raw = env::var("PMC_ROLE").unwrap_or_else(|_| "X".to_string());
    raw.parse().map_err(|e: pmc::PmcError| format!("PMC_ROLE: {e}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init();
}

fn print_help() {
    eprintln!(
        "pmc - Public Member Code CLI\n\n\
Usage:\n  pmc issue [--tier F50|H1|FF] [--role X|A..G] [--first <name>] [--last <name>] [--dob <YYYYMMDD>] [--phone <last6>]\n            [--nm2 <NM> --sig <SIG>] [--holder-nm2 <NM> --holder-sig <SIG>] [--json]\n  pmc validate <code> [--json]\n  pmc lookup <code-or-token> [--json]\n  pmc url <token>\n  pmc fingerprint <first> <last>\n  pmc signature <dob> <phone-last6> [--digest]\n  pmc check <payload>\n  pmc selftest\n\n\
Environment:\n  PMC_TIER  default tier (F50)\n  PMC_ROLE  default role (X)\n  RUST_LOG  log filter, written to stderr\n"
    );
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_identity(
    nm2: Option<&str>,
    sig: Option<&str>,
    what: &str,
) -> Result<Option<Identity>, String> {
    match (nm2, sig) {
        (None, None) => Ok(None),
        (Some(nm2), Some(sig)) => {
            let nm2 = nm2.parse().map_err(|e: pmc::PmcError| e.to_string())?;
            let sig = sig.parse().map_err(|e: pmc::PmcError| e.to_string())?;
            Ok(Some(Identity::new(nm2, sig)))
        }
        _ => Err(format!("{what} needs both nm2 and sig")),
    }
}

fn parse_issue_flags(args: &[String]) -> Result<IssueOpts, String> {
    let mut opts = IssueOpts::from_env()?;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--json" => {
                opts.json = true;
                i += 1;
                continue;
            }
            "--tier" => {
                opts.tier = take_value(args, i, "--tier")?
                    .parse()
                    .map_err(|e: pmc::PmcError| e.to_string())?;
            }
            "--role" => {
                opts.role = take_value(args, i, "--role")?
                    .parse()
                    .map_err(|e: pmc::PmcError| e.to_string())?;
            }
            "--first" => opts.first = take_value(args, i, "--first")?,
            "--last" => opts.last = take_value(args, i, "--last")?,
            "--dob" => opts.dob = Some(take_value(args, i, "--dob")?),
            "--phone" => opts.phone = Some(take_value(args, i, "--phone")?),
            "--nm2" => opts.nm2 = Some(take_value(args, i, "--nm2")?),
            "--sig" => opts.sig = Some(take_value(args, i, "--sig")?),
            "--holder-nm2" => opts.holder_nm2 = Some(take_value(args, i, "--holder-nm2")?),
            "--holder-sig" => opts.holder_sig = Some(take_value(args, i, "--holder-sig")?),
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
        i += 2;
    }

    Ok(opts)
}

fn build_request(opts: &IssueOpts) -> Result<IssueRequest, String> {
    let mut req = IssueRequest::new(opts.tier, opts.role).names(&opts.first, &opts.last);
    req.date_of_birth = opts.dob.clone();
    req.phone_last6 = opts.phone.clone();
    req.existing = parse_identity(opts.nm2.as_deref(), opts.sig.as_deref(), "--nm2/--sig")?;
    req.holder = parse_identity(
        opts.holder_nm2.as_deref(),
        opts.holder_sig.as_deref(),
        "--holder-nm2/--holder-sig",
    )?;
    Ok(req)
}

fn run_issue(args: &[String]) -> Result<(), String> {
    let opts = parse_issue_flags(args)?;
    let req = build_request(&opts)?;
    let code = issue(&req).map_err(|e| e.to_string())?;

    if opts.json {
        println!(
            "{}",
            serde_json::to_string(&code).map_err(|e| e.to_string())?
        );
    } else {
        println!("{}", code.display);
    }
    Ok(())
}

fn split_json_flag(args: &[String]) -> (Vec<String>, bool) {
    let mut json_out = false;
    let mut rest = Vec::new();
    for arg in args {
        if arg == "--json" {
            json_out = true;
        } else {
            rest.push(arg.clone());
        }
    }
    (rest, json_out)
}

fn report(result: ValidationResult, json_out: bool) -> Result<(), String> {
    if json_out {
        println!(
            "{}",
            serde_json::to_string(&result).map_err(|e| e.to_string())?
        );
    }
    match result {
        ValidationResult::Valid { core, role } => {
            if !json_out {
                println!("core={} role={}", core, role);
            }
            Ok(())
        }
        ValidationResult::Invalid { reason } => Err(reason.message().to_string()),
    }
}

fn run_validate(args: &[String]) -> Result<(), String> {
    let (rest, json_out) = split_json_flag(args);
    let code = rest.first().ok_or("validate requires a code")?;
    report(validate(code), json_out)
}

fn run_lookup(args: &[String]) -> Result<(), String> {
    let (rest, json_out) = split_json_flag(args);
    let code = rest.first().ok_or("lookup requires a code")?;
    report(lookup(code), json_out)
}

fn run_url(args: &[String]) -> Result<(), String> {
    let token = args.first().ok_or("url requires a token")?;
    let (core, role) = parse_url_safe(token).ok_or("invalid url-safe code")?;
    println!("core={} role={}", core, role);
    Ok(())
}

fn run_fingerprint(args: &[String]) -> Result<(), String> {
    if args.len() != 2 {
        return Err("fingerprint requires <first> <last>".to_string());
    }
    println!("{}", derive_fingerprint(&args[0], &args[1]));
    Ok(())
}

fn run_signature(args: &[String]) -> Result<(), String> {
    let digest = args.iter().any(|a| a == "--digest");
    let inputs: Vec<&String> = args.iter().filter(|a| a.as_str() != "--digest").collect();
    if inputs.len() != 2 {
        return Err("signature requires <dob> <phone-last6>".to_string());
    }
    let sig = derive_signature(inputs[0], inputs[1]);
    if digest {
        println!("{} {}", sig, signature_digest_hex(inputs[0], inputs[1]));
    } else {
        println!("{}", sig);
    }
    Ok(())
}

fn run_check(args: &[String]) -> Result<(), String> {
    let payload = args.first().ok_or("check requires a payload")?;
    let normalized = normalize(payload).map_err(|e| e.to_string())?;
    let chk = checksum(&normalized).map_err(|e| e.to_string())?;
    println!("{}", chk);
    Ok(())
}

fn run_selftest() -> Result<(), String> {
    let req = IssueRequest::new(Tier::F50, Role::X)
        .names("Matt", "Hardage")
        .signature_inputs("19881203", "123456");
    let code = issue(&req).map_err(|e| e.to_string())?;
    debug!(display = %code.display, "selftest sample");

    if !validate(&code.display).is_valid() {
        return Err("selftest failed: display does not validate".to_string());
    }
    if parse_url_safe(&code.url_safe) != Some((code.core.clone(), code.role)) {
        return Err("selftest failed: url-safe round trip".to_string());
    }
    let payload = json!({
        "ok": true,
        "sample": code.display,
    });
    println!("{}", payload);
    Ok(())
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        process::exit(2);
    }

    if args[0] == "-h" || args[0] == "--help" || args[0] == "help" {
        print_help();
        return;
    }

    let cmd = args[0].as_str();
    let rest = &args[1..];

    let res = match cmd {
        "issue" => run_issue(rest),
        "validate" => run_validate(rest),
        "lookup" => run_lookup(rest),
        "url" => run_url(rest),
        "fingerprint" => run_fingerprint(rest),
        "signature" => run_signature(rest),
        "check" => run_check(rest),
        "selftest" => run_selftest(),
        _ => Err(format!("unknown command: {}", cmd)),
    };

    if let Err(err) = res {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
