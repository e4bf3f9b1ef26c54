//! Reusable project content and tool stand-ins

pub const PYPROJECT: &str = r#"[project]
name = "chat-backend"
version = "0.1.0"
requires-python = ">=3.11"
dependencies = ["fastapi>=0.110", "uvicorn[standard]>=0.29"]
"#;

pub const UV_LOCK: &str = r#"version = 1
requires-python = ">=3.11"

[[package]]
name = "chat-backend"
version = "0.1.0"
source = { virtual = "." }
dependencies = [
    { name = "fastapi" },
    { name = "uvicorn", extra = ["standard"] },
]

[package.metadata]
requires-dist = [
    { name = "fastapi", specifier = ">=0.110" },
    { name = "uvicorn", extras = ["standard"], specifier = ">=0.29" },
]

[[package]]
name = "fastapi"
version = "0.115.6"
source = { registry = "https://pypi.org/simple" }

[[package]]
name = "uvicorn"
version = "0.32.1"
source = { registry = "https://pypi.org/simple" }
"#;

/// Resolved before uvicorn was added to the manifest
pub const STALE_UV_LOCK: &str = r#"version = 1

[[package]]
name = "chat-backend"
version = "0.1.0"
source = { virtual = "." }

[package.metadata]
requires-dist = [{ name = "fastapi", specifier = ">=0.110" }]

[[package]]
name = "fastapi"
version = "0.115.6"
source = { registry = "https://pypi.org/simple" }
"#;

pub const PACKAGE_JSON: &str = r#"{
  "name": "chat-frontend",
  "private": true,
  "scripts": { "build": "vite build" },
  "dependencies": { "react": "^18.3.1" },
  "devDependencies": { "vite": "^5.4.0" }
}"#;

pub const PACKAGE_LOCK: &str = r#"{
  "name": "chat-frontend",
  "lockfileVersion": 3,
  "packages": {
    "": {
      "name": "chat-frontend",
      "dependencies": { "react": "^18.3.1" },
      "devDependencies": { "vite": "^5.4.0" }
    },
    "node_modules/react": { "version": "18.3.1" },
    "node_modules/vite": { "version": "5.4.11", "dev": true }
  }
}"#;

pub const MAIN_PY: &str = "from fastapi import FastAPI\n\napp = FastAPI()\n";

/// `fake-npm.sh ci|install|run build`, run from the frontend workspace
pub const FAKE_NPM: &str = r#"#!/bin/sh
case "$1" in
  ci|install)
    mkdir -p node_modules/.installed
    ;;
  run)
    mkdir -p dist/assets
    printf '<!doctype html><div id="root"></div>\n' > dist/index.html
    printf 'console.log("app");\n' > dist/assets/app.js
    ;;
  *)
    echo "fake-npm: unknown command $1" >&2
    exit 2
    ;;
esac
"#;

/// `fake-pip.sh install --target DIR [--no-deps] -r FILE`
///
/// Writes one `*.dist-info` per requirement line; unpinned lines get 1.0.0.
pub const FAKE_PIP: &str = r#"#!/bin/sh
target=""
req=""
while [ $# -gt 0 ]; do
  case "$1" in
    --target) target="$2"; shift 2 ;;
    -r) req="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if [ -z "$target" ] || [ -z "$req" ]; then
  echo "fake-pip: --target and -r are required" >&2
  exit 2
fi
mkdir -p "$target"
while IFS= read -r line || [ -n "$line" ]; do
  [ -z "$line" ] && continue
  case "$line" in
    *==*) name="${line%%==*}"; version="${line#*==}" ;;
    *) name=$(printf '%s' "$line" | sed 's/[][<>=!~;, ].*//'); version="1.0.0" ;;
  esac
  name="${name%%\[*}"
  dist="$target/$name-$version.dist-info"
  mkdir -p "$dist"
  printf 'Metadata-Version: 2.1\nName: %s\nVersion: %s\n' "$name" "$version" > "$dist/METADATA"
done < "$req"
"#;
