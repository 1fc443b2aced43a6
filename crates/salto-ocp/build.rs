//! Build script for salto-ocp
//!
//! When the `ipopt` feature is enabled, locates the Ipopt installation
//! and the generated model-function library and emits the link
//! directives for them. Without the feature this is a no-op.
//!
//! Prerequisites for `--features ipopt`:
//! - Ipopt installed, with `IPOPT_DIR` pointing at its prefix
//! - The generated model-function library built into the directory
//!   named by `SALTO_NLP_LIB_DIR`

use std::env;
use std::path::PathBuf;

fn main() {
    #[cfg(not(feature = "ipopt"))]
    {
        println!("cargo:warning=ipopt feature not enabled, skipping solver linkage");
    }

    #[cfg(feature = "ipopt")]
    link_ipopt();
}

#[cfg(feature = "ipopt")]
fn link_ipopt() {
    println!("cargo:rerun-if-env-changed=IPOPT_DIR");
    println!("cargo:rerun-if-env-changed=SALTO_NLP_LIB_DIR");

    let ipopt_dir = env::var("IPOPT_DIR").unwrap_or_else(|_| {
        // Try common locations
        if PathBuf::from("/opt/ipopt").exists() {
            "/opt/ipopt".to_string()
        } else {
            "/usr/local".to_string()
        }
    });

    let ipopt_path = PathBuf::from(&ipopt_dir);
    if !ipopt_path.join("lib").exists() {
        println!("cargo:warning=Ipopt not found at {}", ipopt_dir);
        println!("cargo:warning=Set IPOPT_DIR to the Ipopt installation prefix");
    }

    println!("cargo:rustc-link-search=native={}/lib", ipopt_dir);
    println!("cargo:rustc-link-lib=ipopt");

    // Generated model-function library (objective/constraint callbacks)
    match env::var("SALTO_NLP_LIB_DIR") {
        Ok(dir) => {
            println!("cargo:rustc-link-search=native={}", dir);
            println!("cargo:rustc-link-lib=static=salto_nlp");
        }
        Err(_) => {
            println!("cargo:warning=SALTO_NLP_LIB_DIR not set");
            println!("cargo:warning=The generated model-function library is required for solving");
        }
    }

    println!("cargo:rustc-link-lib=m");
}
